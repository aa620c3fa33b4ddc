#![no_main]
use libfuzzer_sys::fuzz_target;
use outfilter_log::{Document, ParseOptions};

fuzz_target!(|data: &[u8]| {
    // Lossy conversion keeps inputs that are almost text.
    let text = String::from_utf8_lossy(data);
    if let Ok(mut document) = Document::parse(&text) {
        for command in document.commands() {
            let _ = command.outline();
        }
        let _ = document.reclassify();
    }
    let _ = Document::parse_with(&text, ParseOptions::strict());
});
