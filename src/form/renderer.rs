use std::fmt;

use super::orchestrator::SubmissionState;
use crate::models::GeneratedImage;

pub const PLACEHOLDER_TITLE: &str = "Ready to Create";
pub const PLACEHOLDER_HINT: &str =
    "Upload images and write a prompt, then press Generate to start creating.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub index: usize,
    pub src: String,
    pub alt: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultBody {
    Placeholder,
    Grid(Vec<Tile>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultView {
    pub busy: bool,
    pub error: Option<String>,
    pub body: ResultBody,
}

/// Derives the result panel from the submission state and the last
/// successful result set. Tiles keep the order the service returned.
pub fn render(state: &SubmissionState, last_results: Option<&[GeneratedImage]>) -> ResultView {
    let shown = match state {
        SubmissionState::Succeeded(results) => Some(results.as_slice()),
        _ => last_results,
    };
    let body = match shown {
        Some(images) => ResultBody::Grid(
            images
                .iter()
                .enumerate()
                .map(|(index, image)| Tile {
                    index,
                    src: image.url.clone(),
                    alt: format!("Generated {}", index),
                })
                .collect(),
        ),
        None => ResultBody::Placeholder,
    };
    let error = match state {
        SubmissionState::Failed(message) => Some(message.clone()),
        _ => None,
    };

    ResultView {
        busy: matches!(state, SubmissionState::Submitting),
        error,
        body,
    }
}

impl ResultView {
    pub fn tiles(&self) -> &[Tile] {
        match &self.body {
            ResultBody::Grid(tiles) => tiles,
            ResultBody::Placeholder => &[],
        }
    }

    /// HTML fragment for the result panel. Service text and image references
    /// are escaped; the service is not trusted to send markup-safe text.
    pub fn to_html(&self) -> String {
        let mut html = String::from("<section class=\"results\">");
        if self.busy {
            html.push_str("<p class=\"status\">Generating...</p>");
        }
        if let Some(error) = &self.error {
            html.push_str(&format!(
                "<div class=\"error\">{}</div>",
                ammonia::clean_text(error)
            ));
        }
        match &self.body {
            ResultBody::Placeholder => html.push_str(&format!(
                "<div class=\"placeholder\"><p>{}</p><p>{}</p></div>",
                PLACEHOLDER_TITLE, PLACEHOLDER_HINT
            )),
            ResultBody::Grid(tiles) => {
                html.push_str("<div class=\"grid\">");
                for tile in tiles {
                    html.push_str(&format!(
                        "<img src=\"{}\" alt=\"{}\">",
                        ammonia::clean_text(&tile.src),
                        ammonia::clean_text(&tile.alt)
                    ));
                }
                html.push_str("</div>");
            }
        }
        html.push_str("</section>");
        html
    }
}

impl fmt::Display for ResultView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.busy {
            writeln!(f, "Generating...")?;
        }
        if let Some(error) = &self.error {
            writeln!(f, "Error: {}", error)?;
        }
        match &self.body {
            ResultBody::Placeholder => {
                writeln!(f, "{}", PLACEHOLDER_TITLE)?;
                write!(f, "{}", PLACEHOLDER_HINT)
            }
            ResultBody::Grid(tiles) => {
                for tile in tiles {
                    let src = if tile.src.len() > 96 {
                        format!("{}... ({} chars)", truncate(&tile.src, 96), tile.src.len())
                    } else {
                        tile.src.clone()
                    };
                    writeln!(f, "[{}] {}", tile.index, src)?;
                }
                Ok(())
            }
        }
    }
}

fn truncate(value: &str, max: usize) -> &str {
    match value.char_indices().nth(max) {
        Some((cut, _)) => &value[..cut],
        None => value,
    }
}
