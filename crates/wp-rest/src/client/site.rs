use serde_json::Value;
use tracing::instrument;

use wp_api_client::{MultipartForm, Result};

impl super::WordPressClient {
    /// The authenticated user (`users/me`).
    #[instrument(skip(self))]
    pub async fn get_current_user(&self) -> Result<Value> {
        self.get("users/me", &[]).await
    }

    /// The API root document: site name, description, namespaces and routes.
    #[instrument(skip(self))]
    pub async fn get_site_info(&self) -> Result<Value> {
        self.get("", &[]).await
    }

    /// Upload a file to the media library.
    ///
    /// The multipart encoder supplies its own content type and boundary.
    #[instrument(skip(self, form), fields(parts = form.len()))]
    pub async fn upload_media(&self, form: MultipartForm) -> Result<Value> {
        let request = self.http.post("media").multipart(form);
        Ok(self.http.execute(request).await?.into_json())
    }
}
