use backend::procedures::ReportSubmission;

use crate::location::{ReportLocation, ValidationFailure};

/// The text fields of a citizen report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportForm {
    pub name: String,
    pub kind: String,
    pub comments: String,
}

impl ReportForm {
    pub fn new(
        name: impl Into<String>,
        kind: impl Into<String>,
        comments: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            comments: comments.into(),
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Checks the form and location and builds the request body.
    pub fn validate(
        &self,
        location: Option<ReportLocation>,
    ) -> Result<ReportSubmission, ValidationFailure> {
        let name = self.name.trim();
        let kind = self.kind.trim();
        let comments = self.comments.trim();
        if name.is_empty() || kind.is_empty() || comments.is_empty() {
            return Err(ValidationFailure::MissingFields);
        }
        let location = location.ok_or(ValidationFailure::MissingLocation)?;
        Ok(ReportSubmission {
            p_nombre: name.to_string(),
            p_tipo_requerimiento: kind.to_string(),
            p_comentarios: comments.to_string(),
            p_lat: location.lat(),
            p_lng: location.lng(),
        })
    }
}
