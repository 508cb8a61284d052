//! Backend client: templates, their forms, files, uploaded documents and XML
//! export. Works natively (CLI) and on wasm32 (web front-end).

use std::collections::BTreeMap;

use reqwest::multipart::{Form as Multipart, Part};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use template_core::template::TemplateBody;
use template_core::Parameter;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{context}: server returned {status}")]
    Status { status: StatusCode, context: &'static str },
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApiConfig {
    /// Prefix for every `/api/...` path; empty means same origin.
    pub base_url: String,
    pub token: Option<String>,
}

impl ApiConfig {
    /// Values baked in at compile time (web build).
    pub fn from_build_env() -> Self {
        Self {
            base_url: option_env!("TEMPLATE_API_URL").unwrap_or_default().to_string(),
            token: option_env!("TEMPLATE_API_TOKEN").map(str::to_string),
        }
    }

    /// Values from the process environment (CLI).
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("TEMPLATE_API_URL").unwrap_or_default(),
            token: std::env::var("TEMPLATE_API_TOKEN").ok().filter(|t| !t.is_empty()),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TemplateSummary {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewTemplate {
    pub name: String,
    pub description: Option<String>,
}

/// A template form as stored on the server: page images plus per-page
/// parameters, in the same shape as a saved template file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Form {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub template: Option<TemplateBody>,
    #[serde(rename = "allPageParams", default)]
    pub all_page_params: Option<BTreeMap<u32, Vec<Parameter>>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FileSummary {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub template_id: Option<i64>,
    #[serde(default)]
    pub user_id: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewFile {
    pub name: String,
    pub template_id: i64,
    pub user_id: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: i64,
    pub file_id: i64,
    pub form_id: i64,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub params: Option<serde_json::Value>,
}

/// One rasterised page of an uploaded document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageUpload {
    pub page: u32,
    pub png: Vec<u8>,
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ApiConfig,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Self {
        Self { http: reqwest::Client::new(), config }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut req = self.http.request(method, self.config.url(path));
        if let Some(token) = &self.config.token {
            req = req.bearer_auth(token);
        }
        req
    }

    async fn send(req: RequestBuilder, context: &'static str) -> Result<Response, ApiError> {
        let resp = req.send().await.map_err(|e| {
            log::error!("{context}: {e}");
            e
        })?;
        let status = resp.status();
        if !status.is_success() {
            log::error!("{context}: {status}");
            return Err(ApiError::Status { status, context });
        }
        Ok(resp)
    }

    async fn json<T: DeserializeOwned>(req: RequestBuilder, context: &'static str) -> Result<T, ApiError> {
        let text = Self::send(req, context).await?.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    pub async fn list_templates(&self) -> Result<Vec<TemplateSummary>, ApiError> {
        Self::json(self.request(Method::GET, "/api/templates"), "list templates").await
    }

    pub async fn create_template(&self, new: &NewTemplate) -> Result<TemplateSummary, ApiError> {
        Self::json(self.request(Method::POST, "/api/templates").json(new), "create template").await
    }

    pub async fn list_forms(&self, template_id: i64) -> Result<Vec<Form>, ApiError> {
        let path = format!("/api/templates/{template_id}/forms");
        Self::json(self.request(Method::GET, &path), "list forms").await
    }

    /// Multipart `name` + `image`.
    pub async fn upload_form(
        &self,
        template_id: i64,
        name: &str,
        image: Vec<u8>,
        mime: &str,
    ) -> Result<serde_json::Value, ApiError> {
        let part = Part::bytes(image).file_name("form.png").mime_str(mime)?;
        let body = Multipart::new().text("name", name.to_string()).part("image", part);
        let path = format!("/api/templates/{template_id}/forms");
        Self::json(self.request(Method::POST, &path).multipart(body), "upload form").await
    }

    pub async fn list_files(&self) -> Result<Vec<FileSummary>, ApiError> {
        Self::json(self.request(Method::GET, "/api/files"), "list files").await
    }

    pub async fn create_file(&self, new: &NewFile) -> Result<FileSummary, ApiError> {
        Self::json(self.request(Method::POST, "/api/files").json(new), "create file").await
    }

    pub async fn list_documents(&self, file_id: i64) -> Result<Vec<DocumentRecord>, ApiError> {
        let path = format!("/api/files/{file_id}/documents");
        Self::json(self.request(Method::GET, &path), "list documents").await
    }

    /// `PUT` every page as multipart: `page_count`, then `"<n>"` ->
    /// `page-<n>.png`.
    pub async fn upload_document_pages(
        &self,
        file_id: i64,
        form_id: i64,
        pages: Vec<PageUpload>,
    ) -> Result<serde_json::Value, ApiError> {
        let body = page_multipart(pages)?;
        let path = format!("/api/files/{file_id}/documents/{form_id}");
        Self::json(self.request(Method::PUT, &path).multipart(body), "upload document").await
    }

    pub async fn export_file(&self, file_id: i64) -> Result<String, ApiError> {
        let path = format!("/api/files/{file_id}/export");
        let req = self.request(Method::GET, &path).header(reqwest::header::ACCEPT, "application/xml");
        Ok(Self::send(req, "export file").await?.text().await?)
    }
}

fn page_multipart(pages: Vec<PageUpload>) -> Result<Multipart, ApiError> {
    let mut body = Multipart::new().text("page_count", pages.len().to_string());
    for page in pages {
        let part = Part::bytes(page.png)
            .file_name(format!("page-{}.png", page.page))
            .mime_str("image/png")?;
        body = body.part(page.page.to_string(), part);
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn urls_join_without_double_slash() {
        let cfg = ApiConfig { base_url: "http://localhost:8000/".into(), token: None };
        assert_eq!(cfg.url("/api/templates"), "http://localhost:8000/api/templates");
        let same_origin = ApiConfig::default();
        assert_eq!(same_origin.url("/api/files/3/export"), "/api/files/3/export");
    }

    #[test]
    fn file_list_tolerates_missing_links() {
        let files: Vec<FileSummary> = serde_json::from_value(json!([
            {"id": 1, "name": "march", "template_id": 2, "user_id": 1, "created_at": "2025-01-01T00:00:00"},
            {"id": 2, "name": "april"}
        ]))
        .unwrap();
        assert_eq!(files[0].template_id, Some(2));
        assert_eq!(files[1].user_id, None);
    }

    #[test]
    fn forms_carry_page_params() {
        let form: Form = serde_json::from_value(json!({
            "id": 5,
            "name": "Invoice",
            "formType": "invoice",
            "template": {
                "source": {"type": "pdf", "filename": "a.pdf", "allPages": [1], "totalPages": 1},
                "data": [{"page": 1, "binary": "AAAA", "size": {"width": 800, "height": 1131}, "type": "image/png"}]
            },
            "allPageParams": {"1": [{"id": "Total", "type": "currency", "x1": "1.00", "y1": "2.00", "x2": "3.00", "y2": "4.00", "isMultiline": false, "page": 1}]}
        }))
        .unwrap();
        let params = form.all_page_params.unwrap();
        assert_eq!(params[&1][0].id, "Total");
        assert_eq!(form.template.unwrap().data.len(), 1);
    }

    #[test]
    fn forms_without_template_still_parse() {
        let form: Form = serde_json::from_value(json!({"id": 1, "name": "blank", "template": null})).unwrap();
        assert!(form.template.is_none());
        assert!(form.all_page_params.is_none());
    }

    #[test]
    fn new_file_wire_shape() {
        let body = serde_json::to_value(NewFile { name: "march".into(), template_id: 2, user_id: 1 }).unwrap();
        assert_eq!(body, json!({"name": "march", "template_id": 2, "user_id": 1}));
    }

    #[test]
    fn page_uploads_build() {
        let form = page_multipart(vec![
            PageUpload { page: 1, png: vec![1, 2, 3] },
            PageUpload { page: 2, png: vec![4] },
        ]);
        assert!(form.is_ok());
    }
}
