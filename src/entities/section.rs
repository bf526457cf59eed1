use serde::{Deserialize, Serialize};
use crate::error::{Entity, InvalidRecord, ValidationError};

pub type SectionId = i64;

pub const GENERAL_SECTION_NAME: &str = "General";
pub const DEFAULT_SECTION_COLOR: &str = "#6B7280";

/// A named, colored grouping of media items.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MediaSection {
    pub id: SectionId,
    pub name: String,
    pub description: Option<String>,
    pub color: String,
}

impl MediaSection {
    pub fn is_general(&self) -> bool {
        self.name.eq_ignore_ascii_case(GENERAL_SECTION_NAME)
    }
}

/// Sections shown when the repository cannot be reached.
pub fn default_sections() -> Vec<MediaSection> {
    [
        (1, GENERAL_SECTION_NAME, "General school media", DEFAULT_SECTION_COLOR),
        (2, "Events", "School events and celebrations", "#10B981"),
        (3, "Students", "Student activities and achievements", "#3B82F6"),
        (4, "Teachers", "Teaching staff and faculty", "#8B5CF6"),
        (5, "Facilities", "Campus buildings and facilities", "#F59E0B"),
        (6, "Activities", "Extracurricular activities", "#EF4444"),
    ]
        .into_iter()
        .map(|(id, name, description, color)| MediaSection {
            id,
            name: name.to_string(),
            description: Some(description.to_string()),
            color: color.to_string(),
        })
        .collect()
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct SectionForm {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl SectionForm {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Trims every field, drops a blank description and fills in the default color.
    pub fn normalized(&self) -> Result<SectionForm, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::NameRequired);
        }
        let description = self.description.as_deref()
            .map(str::trim)
            .filter(|x| !x.is_empty())
            .map(str::to_string);
        let color = self.color.as_deref()
            .map(str::trim)
            .filter(|x| !x.is_empty())
            .unwrap_or(DEFAULT_SECTION_COLOR)
            .to_string();
        Ok(SectionForm { name: name.to_string(), description, color: Some(color) })
    }
}

/// Section as it arrives from the content repository, before validation.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct SectionRecord {
    pub id: SectionId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl TryFrom<SectionRecord> for MediaSection {
    type Error = InvalidRecord;

    fn try_from(value: SectionRecord) -> Result<Self, Self::Error> {
        let name = value.name
            .map(|x| x.trim().to_string())
            .filter(|x| !x.is_empty())
            .ok_or_else(|| InvalidRecord::new(Entity::Section, value.id, "name is blank"))?;
        let color = value.color
            .filter(|x| !x.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SECTION_COLOR.to_string());
        Ok(Self {
            id: value.id,
            name,
            description: value.description.filter(|x| !x.trim().is_empty()),
            color,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sections_start_with_general() {
        let sections = default_sections();
        let names = sections.iter().map(|x| x.name.as_str()).collect::<Vec<&str>>();
        assert_eq!(names, vec!["General", "Events", "Students", "Teachers", "Facilities", "Activities"]);
        assert!(sections[0].is_general());
        assert_eq!(sections.iter().map(|x| x.id).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn normalized_form_requires_name() {
        assert_eq!(SectionForm::new("   ").normalized(), Err(ValidationError::NameRequired));
        assert_eq!(SectionForm::default().normalized(), Err(ValidationError::NameRequired));
    }

    #[test]
    fn normalized_form_fills_defaults() {
        let form = SectionForm::new("  Sports ").with_description("  ").normalized().unwrap();
        assert_eq!(form.name, "Sports");
        assert_eq!(form.description, None);
        assert_eq!(form.color.as_deref(), Some(DEFAULT_SECTION_COLOR));

        let form = SectionForm::new("Events").with_color("#10B981").normalized().unwrap();
        assert_eq!(form.color.as_deref(), Some("#10B981"));
    }

    #[test]
    fn record_with_blank_name_is_rejected() {
        let record = SectionRecord { id: 9, name: Some(" ".to_string()), ..Default::default() };
        assert!(MediaSection::try_from(record).is_err());
    }

    #[test]
    fn record_without_color_gets_default() {
        let record: SectionRecord = serde_json::from_str(r#"{"id": 4, "name": "Teachers"}"#).unwrap();
        let section = MediaSection::try_from(record).unwrap();
        assert_eq!(section.color, DEFAULT_SECTION_COLOR);
        assert_eq!(section.description, None);
    }
}
