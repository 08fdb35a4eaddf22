//! Typed access to the lost-and-found REST API. Every call goes through the
//! caller-supplied `ApiClient`, so bearer attach, refresh-and-retry and error
//! notification apply uniformly.

pub mod models;

use std::path::Path;

use tracing::debug;

use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::error::{AppError, AppResult};
use crate::identity::UserIdentity;

pub use models::*;

pub const PLACEHOLDER_IMAGE: &str = "assets/placeholder-image.png";

fn seg(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

/// Guess a content type for an upload from its extension.
pub fn content_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "pdf" => Some("application/pdf"),
        _ => None,
    }
}

pub struct LostFoundApi {
    client: ApiClient,
    config: ClientConfig,
}

impl LostFoundApi {
    pub fn new(client: ApiClient, config: ClientConfig) -> Self { Self { client, config } }

    pub fn config(&self) -> &ClientConfig { &self.config }

    fn url(&self, path: &str) -> String { self.config.endpoint(path) }

    // --- items ---

    pub async fn list_items(&self, filter: &ItemFilter) -> AppResult<Vec<ItemResponse>> {
        self.client.get_json(&format!("{}{}", self.url("items"), filter.query_string())).await
    }

    pub async fn get_item(&self, id: &str) -> AppResult<ItemResponse> {
        self.client.get_json(&self.url(&format!("items/{}", seg(id)))).await
    }

    pub async fn report_lost(&self, req: &CreateLostItemRequest) -> AppResult<ItemResponse> {
        req.validate()?;
        self.client.post_json(&self.url("items/lost"), req).await
    }

    pub async fn report_found(&self, req: &CreateFoundItemRequest) -> AppResult<ItemResponse> {
        req.validate()?;
        self.client.post_json(&self.url("items/found"), req).await
    }

    // --- uploads ---

    pub async fn upload_bytes(&self, file_name: &str, content_type: Option<&str>, bytes: Vec<u8>) -> AppResult<UploadResponse> {
        if bytes.is_empty() {
            return Err(AppError::user("empty_upload", format!("{} is empty", file_name)));
        }
        debug!(target: "lostfound::api", "upload {} ({} bytes)", file_name, bytes.len());
        self.client.post_multipart(&self.url("upload"), "file", file_name, content_type, bytes).await
    }

    pub async fn upload_file(&self, path: &Path) -> AppResult<UploadResponse> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AppError::user("upload_read", format!("{}: {}", path.display(), e)))?;
        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("upload").to_string();
        self.upload_bytes(&file_name, content_type_for(path), bytes).await
    }

    // --- enumerations ---

    pub async fn categories(&self) -> AppResult<Vec<ItemCategory>> {
        self.client.get_json(&self.url("enumerations/item-categories")).await
    }

    pub async fn campus_locations(&self) -> AppResult<Vec<CampusLocation>> {
        self.client.get_json(&self.url("enumerations/campus-locations")).await
    }

    pub async fn create_campus_location(&self, req: &CreateCampusLocationRequest) -> AppResult<CampusLocation> {
        req.validate()?;
        self.client.post_json(&self.url("enumerations/campus-locations"), req).await
    }

    // --- claims ---

    pub async fn submit_claim(&self, req: &SubmitClaimRequest) -> AppResult<ClaimResponse> {
        req.validate()?;
        self.client.post_json(&self.url("claims"), req).await
    }

    pub async fn claims_for_item(&self, item_id: &str) -> AppResult<Vec<Claim>> {
        self.client.get_json(&self.url(&format!("items/{}/claims", seg(item_id)))).await
    }

    pub async fn decide_claim(&self, claim_id: &str, decision: ClaimDecision) -> AppResult<()> {
        let body = serde_json::json!({ "status": decision.status() });
        let _: serde_json::Value = self.client.put_json(&self.url(&format!("claims/{}/decide", seg(claim_id))), &body).await?;
        Ok(())
    }

    // --- profile & assets ---

    pub async fn update_profile(&self, req: &UpdateUserRequest) -> AppResult<UserIdentity> {
        if req.name.is_none() && req.phone.is_none() {
            return Err(AppError::user("empty_update", "nothing to update"));
        }
        self.client.put_json(&self.url("users/me"), req).await
    }

    pub async fn my_assets(&self) -> AppResult<Vec<Asset>> {
        self.client.get_json(&self.url("assets/my")).await
    }

    pub async fn create_asset(&self, req: &CreateAssetRequest) -> AppResult<Asset> {
        if req.category_id.trim().is_empty() {
            return Err(AppError::user("missing_field", "category_id is required"));
        }
        self.client.post_json(&self.url("assets"), req).await
    }

    /// Absolute link for an image path returned by the API.
    pub fn image_url(&self, raw: Option<&str>) -> String {
        resolve_image_url(&self.config.asset_origin(), raw)
    }
}

pub fn resolve_image_url(origin: &str, raw: Option<&str>) -> String {
    let Some(v) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return PLACEHOLDER_IMAGE.to_string();
    };
    if v.starts_with("http") {
        return v.to_string();
    }
    format!("{}/{}", origin.trim_end_matches('/'), v.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_url_resolution() {
        let o = "http://10.0.0.5:3000";
        assert_eq!(resolve_image_url(o, None), PLACEHOLDER_IMAGE);
        assert_eq!(resolve_image_url(o, Some("  ")), PLACEHOLDER_IMAGE);
        assert_eq!(resolve_image_url(o, Some("https://cdn.x/a.png")), "https://cdn.x/a.png");
        assert_eq!(resolve_image_url(o, Some("/uploads/a.png")), "http://10.0.0.5:3000/uploads/a.png");
        assert_eq!(resolve_image_url(o, Some("uploads/a.png")), "http://10.0.0.5:3000/uploads/a.png");
    }

    #[test]
    fn content_types() {
        assert_eq!(content_type_for(Path::new("x/photo.JPG")), Some("image/jpeg"));
        assert_eq!(content_type_for(Path::new("notes.txt")), None);
        assert_eq!(content_type_for(Path::new("noext")), None);
    }
}
