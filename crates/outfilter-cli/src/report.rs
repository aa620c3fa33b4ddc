//! InfluxDB line protocol records for synthesis statistics.

use outfilter_log::{CommandKind, Document, ToolVersion};

pub struct Tags<'a> {
    pub version: Option<ToolVersion>,
    pub branch: &'a str,
    pub design: &'a str,
}

impl Tags<'_> {
    fn render(&self) -> String {
        let version = self.version.map_or_else(|| "unknown".to_string(), |version| version.to_string());
        format!(
            "version={},branch={},design={}",
            escape_tag(&version),
            escape_tag(self.branch),
            escape_tag(self.design)
        )
    }
}

/// Commas, spaces and equal signs must be escaped in tag values.
fn escape_tag(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, ',' | ' ' | '=') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub fn synthesis_overview(document: &Document, tags: &Tags<'_>) -> String {
    let synth = document.command(CommandKind::SynthDesign).ok();
    let synthesis_duration = synth
        .and_then(|command| command.timing())
        .map_or(0.0, |timing| timing.elapsed.as_secs_f64());
    let blackboxes = synth.map_or(0, |command| command.blackboxes().len());
    let counts = document.messages().counts();

    format!(
        "vivado_synthesis_overview,{} processing_duration={:.3},synthesis_duration={:.1},info_count={}u,warning_count={}u,critical_count={}u,error_count={}u,blackbox_count={}u",
        tags.render(),
        document.processing_duration().as_secs_f64(),
        synthesis_duration,
        counts.info,
        counts.warning,
        counts.critical_warning,
        counts.error,
        blackboxes,
    )
}

/// One field per used cell type; black box cells are reported in the overview.
pub fn synthesis_cells(document: &Document, tags: &Tags<'_>) -> String {
    let record = format!("vivado_synthesis_cells,{} ", tags.render());
    let Ok(synth) = document.command(CommandKind::SynthDesign) else {
        return record;
    };
    let fields: Vec<_> = synth
        .cells()
        .iter()
        .filter(|(name, _)| !name.ends_with("_bbox"))
        .map(|(name, count)| format!("{name}={count}"))
        .collect();
    record + &fields.join(",")
}

pub fn status(success: Option<bool>) -> &'static str {
    match success {
        Some(true) => "completed successfully",
        Some(false) => "failed",
        None => "no completion line",
    }
}
