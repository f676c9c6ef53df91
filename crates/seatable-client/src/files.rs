use std::fmt;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use seatable_client_core::{SeaTableError, SeaTableResult};

use crate::base::Base;

/// Which asset folder an upload lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    #[default]
    File,
    Image,
}

impl FileType {
    pub fn as_str(&self) -> &str {
        match self {
            FileType::File => "file",
            FileType::Image => "image",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileType {
    type Err = SeaTableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(FileType::File),
            "image" => Ok(FileType::Image),
            other => Err(SeaTableError::invalid_config(format!(
                "file type must be 'file' or 'image', got '{}'",
                other
            ))),
        }
    }
}

/// Reply of `app-upload-link`.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadLink {
    pub upload_link: String,
    pub parent_path: String,
    pub img_relative_path: String,
    pub file_relative_path: String,
}

impl UploadLink {
    /// Default folder (relative to `parent_path`) for a file type.
    pub fn relative_path_for(&self, file_type: FileType) -> &str {
        match file_type {
            FileType::File => &self.file_relative_path,
            FileType::Image => &self.img_relative_path,
        }
    }
}

/// A file stored in the base's asset folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResult {
    #[serde(rename = "type")]
    pub file_type: FileType,
    pub size: u64,
    /// Name as stored; differs from the requested one when the server
    /// renamed it to avoid overwriting.
    pub name: String,
    /// Value to put into a file or image column.
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct UploadedFile {
    name: String,
    #[serde(default)]
    size: u64,
}

#[derive(Debug, Deserialize)]
struct DownloadLinkResponse {
    download_link: String,
}

/// File operations. These need an API token ([`seatable_client_core::TokenKind::Api`])
/// and a prior [`Base::auth`].
impl Base {
    /// Ask the server where to upload assets.
    pub async fn get_file_upload_link(&self) -> SeaTableResult<UploadLink> {
        self.require_file_access()?;
        let url = self.server_endpoint("/api/v2.1/dtable/app-upload-link/");

        let resp = self
            .http()
            .get(url)
            .header(AUTHORIZATION, self.api_token_header()?)
            .send()
            .await?;
        self.handle_response(resp).await
    }

    /// Get a short-lived download URL for an asset path such as
    /// `/files/2024-10/report.pdf`.
    pub async fn get_file_download_link(&self, path: &str) -> SeaTableResult<String> {
        self.require_file_access()?;
        let url = self.server_endpoint("/api/v2.1/dtable/app-download-link/");

        let resp = self
            .http()
            .get(url)
            .header(AUTHORIZATION, self.api_token_header()?)
            .query(&[("path", path)])
            .send()
            .await?;
        let body: DownloadLinkResponse = self.handle_response(resp).await?;
        Ok(body.download_link)
    }

    /// Upload a local file.
    ///
    /// The file is read fully into memory. `remote_name` defaults to the
    /// file's own name. An empty `relative_path` uploads into the default
    /// folder for `file_type`. With `replace` an existing file of the same
    /// name is overwritten, otherwise the server picks a fresh name.
    ///
    /// # Errors
    /// * [`SeaTableError::MissingCapability`] for a non-API token.
    /// * [`SeaTableError::Io`] if the file cannot be read.
    /// * [`SeaTableError::Api`] / [`SeaTableError::Http`] if the upload fails.
    pub async fn upload_local_file(
        &self,
        local_path: impl AsRef<Path>,
        remote_name: Option<&str>,
        relative_path: &str,
        file_type: FileType,
        replace: bool,
    ) -> SeaTableResult<UploadResult> {
        self.require_file_access()?;
        self.session()?;

        let local_path = local_path.as_ref();
        let name = match remote_name {
            Some(name) => name.to_string(),
            None => local_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| {
                    SeaTableError::invalid_config(format!(
                        "cannot derive a file name from '{}'",
                        local_path.display()
                    ))
                })?,
        };

        let content = tokio::fs::read(local_path).await?;
        debug!(path = %local_path.display(), size = content.len(), "Read local file for upload");
        self.upload_content(&name, content, relative_path, file_type, replace)
            .await
    }

    /// Upload the bytes produced by `reader` under `name`.
    ///
    /// Same semantics as [`Base::upload_local_file`].
    pub async fn upload_bytes_file(
        &self,
        name: &str,
        reader: impl Read,
        relative_path: &str,
        file_type: FileType,
        replace: bool,
    ) -> SeaTableResult<UploadResult> {
        self.require_file_access()?;
        self.session()?;

        let content = read_all(reader)?;
        self.upload_content(name, content, relative_path, file_type, replace)
            .await
    }

    async fn upload_content(
        &self,
        name: &str,
        content: Vec<u8>,
        relative_path: &str,
        file_type: FileType,
        replace: bool,
    ) -> SeaTableResult<UploadResult> {
        let link = self.get_file_upload_link().await?;
        let relative = match relative_path.trim_matches('/') {
            "" => link.relative_path_for(file_type).trim_matches('/').to_string(),
            custom => custom.to_string(),
        };

        let mut upload_url = Url::parse(&link.upload_link)?;
        upload_url.query_pairs_mut().append_pair("ret-json", "1");
        debug!(name, relative = %relative, replace, size = content.len(), "Uploading file");

        let form = Form::new()
            .part("file", Part::bytes(content).file_name(name.to_string()))
            .text("parent_dir", link.parent_path.clone())
            .text("relative_path", relative.clone())
            .text("replace", if replace { "1" } else { "0" });

        let resp = self.http().post(upload_url).multipart(form).send().await?;
        let uploaded: Vec<UploadedFile> = self.handle_response(resp).await?;
        let file = uploaded
            .into_iter()
            .next()
            .ok_or_else(|| SeaTableError::malformed("upload reply listed no files"))?;

        let url = self.asset_url(&link.parent_path, &relative, &file.name)?;
        Ok(UploadResult {
            file_type,
            size: file.size,
            name: file.name,
            url,
        })
    }

    /// `{server}/workspace/{workspace_id}{parent_path}/{relative}/{name}`.
    fn asset_url(&self, parent_path: &str, relative: &str, name: &str) -> SeaTableResult<String> {
        let workspace_id = self
            .session()?
            .info
            .workspace_id
            .ok_or_else(|| SeaTableError::malformed("auth response did not include workspace_id"))?;

        let mut url = self.server_url().clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| SeaTableError::invalid_config("server URL cannot hold a path"))?;
            segments.pop_if_empty().push("workspace").push(&workspace_id.to_string());
            segments.extend(parent_path.split('/').filter(|s| !s.is_empty()));
            segments.extend(relative.split('/').filter(|s| !s.is_empty()));
            segments.push(name);
        }
        Ok(url.to_string())
    }

    fn require_file_access(&self) -> SeaTableResult<()> {
        if self.config().token_kind.can_access_files() {
            Ok(())
        } else {
            Err(SeaTableError::MissingCapability(
                "file upload and download need an API token for the base".into(),
            ))
        }
    }
}

fn read_all(mut reader: impl Read) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use seatable_client_core::{BaseConfig, TokenKind};

    #[test]
    fn file_type_parse_and_display() {
        assert_eq!("file".parse::<FileType>().unwrap(), FileType::File);
        assert_eq!("image".parse::<FileType>().unwrap(), FileType::Image);
        assert!(matches!(
            "video".parse::<FileType>(),
            Err(SeaTableError::InvalidConfig(_))
        ));
        assert_eq!(FileType::Image.to_string(), "image");
    }

    #[test]
    fn upload_link_relative_path() {
        let link: UploadLink = serde_json::from_value(serde_json::json!({
            "upload_link": "https://cloud.seatable.io/seafhttp/upload-api/abc",
            "parent_path": "/asset/uuid-1",
            "img_relative_path": "images/2024-10",
            "file_relative_path": "files/2024-10"
        }))
        .unwrap();
        assert_eq!(link.relative_path_for(FileType::File), "files/2024-10");
        assert_eq!(link.relative_path_for(FileType::Image), "images/2024-10");
    }

    #[test]
    fn upload_result_serializes_type_field() {
        let result = UploadResult {
            file_type: FileType::File,
            size: 11,
            name: "hello.md".into(),
            url: "https://cloud.seatable.io/workspace/7/asset/uuid-1/files/hello.md".into(),
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["type"], "file");
        assert_eq!(value["size"], 11);
    }

    #[test]
    fn read_all_collects_reader() {
        let data = read_all(std::io::Cursor::new(b"hello world".to_vec())).unwrap();
        assert_eq!(data, b"hello world");
    }

    #[tokio::test]
    async fn temporary_token_cannot_upload() {
        let config =
            BaseConfig::new("https://cloud.seatable.io", "tok").token_kind(TokenKind::Temporary);
        let base = Base::from_config(config).unwrap();
        let result = base
            .upload_bytes_file("hello.md", &b"hello"[..], "", FileType::File, false)
            .await;
        assert!(matches!(result, Err(SeaTableError::MissingCapability(_))));
    }

    #[tokio::test]
    async fn upload_requires_auth() {
        let base = Base::new("tok", "https://cloud.seatable.io").unwrap();
        let result = base
            .upload_bytes_file("hello.md", &b"hello"[..], "", FileType::File, false)
            .await;
        assert!(matches!(result, Err(SeaTableError::NotAuthenticated)));
    }
}
