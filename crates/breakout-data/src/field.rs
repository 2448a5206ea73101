use serde::{Deserialize, Serialize};

/// Static descriptor of one dataset column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldMeta {
    /// Unique field identifier, used as the row key.
    pub fid: String,
    /// Display name.
    pub name: String,
    pub semantic_type: SemanticType,
    #[serde(default)]
    pub analytic_role: AnalyticRole,
}

impl FieldMeta {
    #[must_use]
    pub fn new(
        fid: impl Into<String>,
        name: impl Into<String>,
        semantic_type: SemanticType,
        analytic_role: AnalyticRole,
    ) -> Self {
        Self {
            fid: fid.into(),
            name: name.into(),
            semantic_type,
            analytic_role,
        }
    }

    /// Shorthand for a quantitative measure whose name is its id.
    #[must_use]
    pub fn measure(fid: impl Into<String>) -> Self {
        let fid = fid.into();
        Self::new(
            fid.clone(),
            fid,
            SemanticType::Quantitative,
            AnalyticRole::Measure,
        )
    }

    /// Shorthand for a nominal dimension whose name is its id.
    #[must_use]
    pub fn dimension(fid: impl Into<String>) -> Self {
        let fid = fid.into();
        Self::new(
            fid.clone(),
            fid,
            SemanticType::Nominal,
            AnalyticRole::Dimension,
        )
    }
}

/// Semantic type of a field, deciding how it is filtered and bucketed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    #[display("quantitative")]
    Quantitative,
    #[display("ordinal")]
    Ordinal,
    #[display("nominal")]
    Nominal,
    #[display("temporal")]
    Temporal,
}

impl SemanticType {
    /// Returns whether values are ordered, filtered by range and bucketed by
    /// binning. Temporal values are epoch milliseconds or date text.
    #[must_use]
    pub fn is_continuous(self) -> bool {
        !matches!(self, SemanticType::Nominal)
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum AnalyticRole {
    #[default]
    #[display("dimension")]
    Dimension,
    #[display("measure")]
    Measure,
}

/// Looks up a field by id.
#[must_use]
pub fn find_field<'a>(fields: &'a [FieldMeta], fid: &str) -> Option<&'a FieldMeta> {
    fields.iter().find(|field| field.fid == fid)
}
