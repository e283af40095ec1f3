//! Synthetic frame renderer.
//!
//! Frames are small SVG images wrapped in a base64 `data:` URL so the
//! payload is self-contained. Anomalous frames use a magenta title with
//! an `ANOMALY` suffix and a translucent dark overlay; normal frames use
//! a cyan title. A handful of faint random strokes are sprinkled over each
//! frame, so output is not deterministic.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use echo_eyes_types::FeedId;
use rand::Rng;

/// Prefix of every rendered payload.
pub const DATA_URL_PREFIX: &str = "data:image/svg+xml;base64,";

const WIDTH: u32 = 640;
const HEIGHT: u32 = 360;
const NOISE_STROKES: usize = 20;

const NORMAL_COLOR: &str = "#33ffcc";
const ANOMALY_COLOR: &str = "#ff0066";

/// Inputs for one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameSpec<'a> {
    /// Feed the frame belongs to.
    pub feed_id: FeedId,
    /// Whether to draw the anomaly treatment.
    pub anomaly: bool,
    /// Free text drawn under the timestamp (may be empty).
    pub annotation: &'a str,
    /// Time printed on the frame.
    pub at: DateTime<Utc>,
}

/// Render a frame to a `data:image/svg+xml;base64,...` URL.
pub fn render_frame(spec: &FrameSpec<'_>, rng: &mut impl Rng) -> String {
    let svg = render_svg(spec, rng);
    let mut url = String::from(DATA_URL_PREFIX);
    STANDARD.encode_string(svg.as_bytes(), &mut url);
    url
}

/// Render the raw SVG document for a frame.
pub fn render_svg(spec: &FrameSpec<'_>, rng: &mut impl Rng) -> String {
    let color = if spec.anomaly { ANOMALY_COLOR } else { NORMAL_COLOR };
    let suffix = if spec.anomaly { " - ANOMALY" } else { "" };
    let overlay = if spec.anomaly {
        r#"<rect x="0" y="0" width="100%" height="100%" fill="black" opacity="0.12"/>"#
    } else {
        ""
    };
    let ts = spec.at.format("%H:%M:%S");
    let annotation = escape_xml(spec.annotation);
    let feed_id = spec.feed_id;

    let mut svg = format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}">
<defs>
<linearGradient id="g" x1="0" x2="1">
<stop offset="0" stop-color="#0f172a"/>
<stop offset="1" stop-color="#02111e"/>
</linearGradient>
<style>
.title {{ font-family: Arial, Helvetica, sans-serif; fill: {color};
  font-size: 22px; font-weight: bold; }}
.meta {{ font-family: Arial, Helvetica, sans-serif; fill: #b7c2c7; font-size: 14px; }}
</style>
</defs>
<rect width="100%" height="100%" fill="url(#g)"/>
{overlay}
<text x="14" y="30" class="title">ECHO EYES - FEED #{feed_id}{suffix}</text>
<text x="14" y="58" class="meta">TS: {ts}</text>
<text x="14" y="90" class="meta">{annotation}</text>
"##
    );

    for _ in 0..NOISE_STROKES {
        let x: f64 = rng.random_range(0.0..f64::from(WIDTH));
        let y: f64 = rng.random_range(0.0..f64::from(HEIGHT));
        let w: f64 = rng.random_range(0.0..3.0);
        let alpha: f64 = rng.random_range(0.0..0.06);
        svg.push_str(&format!(
            r#"<rect x="{x:.1}" y="{y:.1}" width="{w:.2}" height="1" "#
        ));
        svg.push_str(&format!(r#"fill="rgba(255,255,255,{alpha:.3})"/>"#));
        svg.push('\n');
    }
    svg.push_str("</svg>\n");
    svg
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
