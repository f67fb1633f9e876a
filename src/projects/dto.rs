use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::assets::{AssetRef, AssetStore};
use crate::projects::repo::Project;

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub ai_title: Option<String>,
    pub ai_description: Option<String>,
}

impl UpdateProjectRequest {
    /// Field update semantics: absent fields are untouched; an empty `name`
    /// also counts as "no change", while empty AI fields DO overwrite. The
    /// asymmetry is deliberate and load-bearing for existing clients.
    pub fn name_update(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct GenerateBackgroundRequest {
    pub project_id: Uuid,
    pub prompt: String,
}

#[derive(Debug, Deserialize)]
pub struct ContentGenerateRequest {
    pub product_type: String,
    pub key_features: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GeneratedContentResponse {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub original_image_url: Option<String>,
    pub processed_image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProcessedImageResponse {
    pub processed_image_url: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub original_image_url: Option<String>,
    pub processed_image_url: Option<String>,
    pub ai_title: Option<String>,
    pub ai_description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl ProjectResponse {
    /// Persisted refs stay opaque; only the response carries the
    /// externally consumable form.
    pub fn from_project(project: Project, store: &dyn AssetStore) -> Self {
        Self {
            id: project.id,
            user_id: project.user_id,
            name: project.name,
            original_image_url: externalize_opt(store, &project.original_image_path),
            processed_image_url: externalize_opt(store, &project.processed_image_path),
            ai_title: project.ai_title,
            ai_description: project.ai_description,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

pub fn externalize_opt(store: &dyn AssetStore, path: &Option<String>) -> Option<String> {
    path.as_ref()
        .map(|p| store.externalize(&AssetRef::new(p.clone())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_name_update_is_a_no_op() {
        let req = UpdateProjectRequest {
            name: Some(String::new()),
            ai_title: Some(String::new()),
            ai_description: None,
        };
        assert_eq!(req.name_update(), None);
        // the AI field keeps its empty value so it overwrites
        assert_eq!(req.ai_title.as_deref(), Some(""));
    }

    #[test]
    fn present_name_update_passes_through() {
        let req = UpdateProjectRequest {
            name: Some("Summer launch".into()),
            ai_title: None,
            ai_description: None,
        };
        assert_eq!(req.name_update(), Some("Summer launch"));
    }

    #[test]
    fn absent_fields_stay_absent() {
        let req: UpdateProjectRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.name_update(), None);
        assert!(req.ai_title.is_none());
        assert!(req.ai_description.is_none());
    }
}
