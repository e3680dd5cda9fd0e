//! Embed builder

use chrono::{DateTime, Utc};
use cord_core::entities::{EmbedAuthor, EmbedField, EmbedFooter, EmbedMedia};
use cord_core::{DomainError, Embed};
use serde_json::Value;

pub const MAX_TITLE: usize = 256;
pub const MAX_DESCRIPTION: usize = 4096;
pub const MAX_FIELDS: usize = 25;
pub const MAX_FIELD_NAME: usize = 256;
pub const MAX_FIELD_VALUE: usize = 1024;
pub const MAX_FOOTER: usize = 2048;
pub const MAX_AUTHOR_NAME: usize = 256;
pub const MAX_TOTAL: usize = 6000;

/// Builds a rich embed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbedBuilder {
    embed: Embed,
}

impl EmbedBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.embed.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.embed.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.embed.url = Some(url.into());
        self
    }

    #[must_use]
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.embed.timestamp = Some(timestamp);
        self
    }

    #[must_use]
    pub fn timestamp_now(self) -> Self {
        self.timestamp(Utc::now())
    }

    /// RGB color, the alpha byte is ignored
    #[must_use]
    pub fn color(mut self, color: u32) -> Self {
        self.embed.color = Some(color & 0x00FF_FFFF);
        self
    }

    #[must_use]
    pub fn footer(mut self, text: impl Into<String>, icon_url: Option<String>) -> Self {
        self.embed.footer = Some(EmbedFooter {
            text: text.into(),
            icon_url,
        });
        self
    }

    #[must_use]
    pub fn image(mut self, url: impl Into<String>) -> Self {
        self.embed.image = Some(media(url.into()));
        self
    }

    #[must_use]
    pub fn thumbnail(mut self, url: impl Into<String>) -> Self {
        self.embed.thumbnail = Some(media(url.into()));
        self
    }

    #[must_use]
    pub fn author(mut self, name: impl Into<String>, url: Option<String>, icon_url: Option<String>) -> Self {
        self.embed.author = Some(EmbedAuthor {
            name: name.into(),
            url,
            icon_url,
        });
        self
    }

    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.embed.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    #[must_use]
    pub fn inline_field(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.field(name, value, true)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let embed = &self.embed;
        if let Some(title) = &embed.title {
            DomainError::check_max_len("title", title, MAX_TITLE)?;
        }
        if let Some(description) = &embed.description {
            DomainError::check_max_len("description", description, MAX_DESCRIPTION)?;
        }
        if embed.fields.len() > MAX_FIELDS {
            return Err(DomainError::TooManyItems {
                field: "fields",
                max: MAX_FIELDS,
            });
        }
        for field in &embed.fields {
            DomainError::check_len("field name", &field.name, 1, MAX_FIELD_NAME)?;
            DomainError::check_len("field value", &field.value, 1, MAX_FIELD_VALUE)?;
        }
        if let Some(footer) = &embed.footer {
            DomainError::check_max_len("footer", &footer.text, MAX_FOOTER)?;
        }
        if let Some(author) = &embed.author {
            DomainError::check_max_len("author name", &author.name, MAX_AUTHOR_NAME)?;
        }
        if embed.total_length() > MAX_TOTAL {
            return Err(DomainError::FieldTooLong {
                field: "embed",
                max: MAX_TOTAL,
            });
        }
        Ok(())
    }

    /// Characters counted towards the 6000 character limit
    pub fn total_length(&self) -> usize {
        self.embed.total_length()
    }

    /// The validated embed, typed as `rich`
    pub fn build(&self) -> Result<Embed, DomainError> {
        self.validate()?;
        let mut embed = self.embed.clone();
        embed.kind = Some("rich".to_string());
        Ok(embed)
    }

    pub fn to_body(&self) -> Result<Value, DomainError> {
        let embed = self.build()?;
        serde_json::to_value(&embed).map_err(|e| DomainError::Validation(e.to_string()))
    }
}

impl From<Embed> for EmbedBuilder {
    /// Start from a received embed, e.g. to edit it
    fn from(embed: Embed) -> Self {
        Self { embed }
    }
}

fn media(url: String) -> EmbedMedia {
    EmbedMedia {
        url: Some(url),
        proxy_url: None,
        height: None,
        width: None,
    }
}
