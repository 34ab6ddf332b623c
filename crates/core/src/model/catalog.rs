use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use url::Url;

use crate::model::ids::{MaterialId, VideoId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("title cannot be empty")]
    EmptyTitle,
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

fn parse_url(raw: &str) -> Result<Url, CatalogError> {
    Url::parse(raw.trim()).map_err(|_| CatalogError::InvalidUrl(raw.to_owned()))
}

/// Recorded lesson, filterable by discipline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoLesson {
    pub id: VideoId,
    pub title: String,
    pub discipline: String,
    pub subject: String,
    pub description: String,
    pub url: Url,
    pub thumbnail_url: Option<Url>,
}

impl VideoLesson {
    /// # Errors
    ///
    /// Returns `CatalogError` for a blank title or unparsable urls.
    pub fn new(
        title: impl Into<String>,
        discipline: impl Into<String>,
        url: &str,
        thumbnail_url: Option<&str>,
    ) -> Result<Self, CatalogError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(CatalogError::EmptyTitle);
        }
        Ok(Self {
            id: VideoId::generate(),
            title,
            discipline: discipline.into(),
            subject: String::new(),
            description: String::new(),
            url: parse_url(url)?,
            thumbnail_url: thumbnail_url.map(parse_url).transpose()?,
        })
    }

    #[must_use]
    pub fn with_details(mut self, subject: impl Into<String>, description: impl Into<String>) -> Self {
        self.subject = subject.into();
        self.description = description.into();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Price {
    Free,
    Paid { cents: u32 },
}

impl Price {
    #[must_use]
    pub fn is_free(self) -> bool {
        matches!(self, Price::Free)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Price::Free => f.write_str("Grátis"),
            Price::Paid { cents } => write!(f, "R$ {}.{:02}", cents / 100, cents % 100),
        }
    }
}

/// Downloadable or purchasable study material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfMaterial {
    pub id: MaterialId,
    pub name: String,
    pub price: Price,
    pub url: String,
    pub category: String,
}

impl PdfMaterial {
    /// # Errors
    ///
    /// Returns `CatalogError::EmptyTitle` for a blank name.
    pub fn new(
        name: impl Into<String>,
        price: Price,
        url: impl Into<String>,
        category: impl Into<String>,
    ) -> Result<Self, CatalogError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CatalogError::EmptyTitle);
        }
        Ok(Self {
            id: MaterialId::generate(),
            name,
            price,
            url: url.into(),
            category: category.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_formats_like_the_storefront() {
        assert_eq!(Price::Paid { cents: 4990 }.to_string(), "R$ 49.90");
        assert_eq!(Price::Free.to_string(), "Grátis");
    }

    #[test]
    fn video_rejects_bad_url() {
        let err = VideoLesson::new("Aula", "Direito Penal", "nope", None).unwrap_err();
        assert_eq!(err, CatalogError::InvalidUrl("nope".into()));
    }
}
