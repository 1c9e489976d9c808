/// Structured payload of one message, as delivered by the messaging client.
///
/// Only enough of each variant is carried to produce a one-line summary;
/// media bodies never reach this crate.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageContent {
    Text(String),
    ExtendedText { text: String },
    Image { caption: Option<String> },
    Video { caption: Option<String> },
    Audio,
    Document { title: String },
    Buttons { content_text: String },
    ButtonsResponse { selected_display_text: String },
    TemplateButtonReply { selected_display_text: String },
    ListResponse { title: String },
    Sticker,
    ContactCard { display_name: String },
    Location { latitude: f64, longitude: f64 },
    LiveLocation,
    InteractiveResponse { flow_name: String },
    /// A variant this client does not summarize; carries the protocol name.
    Unsupported(String),
}

pub const FALLBACK_SUMMARY: &str = "New message";

impl MessageContent {
    /// Short human-readable summary; never the raw payload.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::Text(text) | Self::ExtendedText { text } => text.clone(),
            Self::Image { .. } => "Photo".to_string(),
            Self::Video { .. } => "Video".to_string(),
            Self::Audio => "Audio".to_string(),
            Self::Document { title } => format!("Document: {title}"),
            Self::Buttons { content_text } => content_text.clone(),
            Self::ButtonsResponse {
                selected_display_text,
            }
            | Self::TemplateButtonReply {
                selected_display_text,
            } => selected_display_text.clone(),
            Self::ListResponse { title } => title.clone(),
            Self::Sticker => "Sticker".to_string(),
            Self::ContactCard { display_name } => display_name.clone(),
            Self::Location {
                latitude,
                longitude,
            } => format!("Location {latitude:.3}, {longitude:.3}"),
            Self::LiveLocation => "Live location".to_string(),
            Self::InteractiveResponse { flow_name } => flow_name.clone(),
            Self::Unsupported(_) => FALLBACK_SUMMARY.to_string(),
        }
    }
}
