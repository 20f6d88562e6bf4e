//! Form fields and payload construction
//!
//! The form holds raw text exactly as typed. Only at submit time are the
//! comma-separated fields turned into lists.

use crate::recommend::RecommendationRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Skills,
    Goals,
    WorkExperience,
    Posts,
}

impl Field {
    pub fn all() -> [Field; 5] {
        [
            Field::Name,
            Field::Skills,
            Field::Goals,
            Field::WorkExperience,
            Field::Posts,
        ]
    }

    pub fn placeholder(&self) -> &'static str {
        match self {
            Field::Name => "Your Name (optional)",
            Field::Skills => "Skills (comma separated)",
            Field::Goals => "Goals (comma separated)",
            Field::WorkExperience => "Work Experience (comma separated)",
            Field::Posts => "Recent Posts (comma separated)",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Field::Name => "Name",
            Field::Skills => "Skills",
            Field::Goals => "Goals",
            Field::WorkExperience => "Work Experience",
            Field::Posts => "Recent Posts",
        }
    }

    pub fn is_required(&self) -> bool {
        matches!(self, Field::Skills | Field::Goals | Field::WorkExperience)
    }

    pub fn next(&self) -> Field {
        match self {
            Field::Name => Field::Skills,
            Field::Skills => Field::Goals,
            Field::Goals => Field::WorkExperience,
            Field::WorkExperience => Field::Posts,
            Field::Posts => Field::Name,
        }
    }

    pub fn prev(&self) -> Field {
        match self {
            Field::Name => Field::Posts,
            Field::Skills => Field::Name,
            Field::Goals => Field::Skills,
            Field::WorkExperience => Field::Goals,
            Field::Posts => Field::WorkExperience,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub name: String,
    pub skills: String,
    pub goals: String,
    pub work_experience: String,
    pub posts: String,
}

impl FormState {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Skills => &self.skills,
            Field::Goals => &self.goals,
            Field::WorkExperience => &self.work_experience,
            Field::Posts => &self.posts,
        }
    }

    pub fn get_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Name => &mut self.name,
            Field::Skills => &mut self.skills,
            Field::Goals => &mut self.goals,
            Field::WorkExperience => &mut self.work_experience,
            Field::Posts => &mut self.posts,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        *self.get_mut(field) = value.into();
    }

    /// Required fields that are still empty, in form order.
    ///
    /// Mirrors an HTML `required` input: only a completely empty value
    /// blocks submission, the comma structure is never checked.
    pub fn missing_required(&self) -> Vec<Field> {
        Field::all()
            .into_iter()
            .filter(|f| f.is_required() && self.get(*f).is_empty())
            .collect()
    }

    /// Build the request payload. `name` is sent verbatim.
    pub fn to_request(&self) -> RecommendationRequest {
        RecommendationRequest {
            name: self.name.clone(),
            skills: split_list(&self.skills),
            goals: split_list(&self.goals),
            work_experience: split_list(&self.work_experience),
            posts: split_list(&self.posts),
        }
    }
}

/// Split on `,`, trim each piece and drop the empty ones, keeping order
/// and duplicates.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
