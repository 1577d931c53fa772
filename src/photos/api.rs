use anyhow::{bail, Context, Result};
use bytes::Bytes;
use reqwest::{
    blocking::{Client, RequestBuilder, Response},
    header::{HeaderValue, CONTENT_TYPE},
    StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::{
    Album, AlbumsPage, ApiError, BatchCreateResponse, MediaItem, MediaItemsPage,
    NewMediaItemResult, Page, PhotosLibrary,
};
use crate::{auth::Session, debug};

pub const API_URI: &str = "https://photoslibrary.googleapis.com/v1";

const SEARCH_PAGE_SIZE: u32 = 100;

impl PhotosLibrary for Session {
    fn list_albums(
        &mut self,
        app_created_only: bool,
        page_token: Option<&str>,
    ) -> Result<Page<Album>> {
        let res = self.send(|http| {
            let req = http
                .get(format!("{API_URI}/albums"))
                .query(&[("excludeNonAppCreatedData", app_created_only)]);

            match page_token {
                Some(page_token) => req.query(&[("pageToken", page_token)]),
                None => req,
            }
        })?;

        decode_json::<AlbumsPage>(res).map(Page::from)
    }

    fn create_album(&mut self, title: &str) -> Result<Album> {
        let res = self.send(|http| {
            http.post(format!("{API_URI}/albums"))
                .json(&json!({ "album": { "title": title } }))
        })?;

        decode_json(res)
    }

    fn search_album(&mut self, album_id: &str, page_token: Option<&str>) -> Result<Page<MediaItem>> {
        let mut body = json!({
            "albumId": album_id,
            "pageSize": SEARCH_PAGE_SIZE,
        });

        if let Some(page_token) = page_token {
            body["pageToken"] = json!(page_token);
        }

        let res = self.send(|http| http.post(format!("{API_URI}/mediaItems:search")).json(&body))?;

        decode_json::<MediaItemsPage>(res).map(Page::from)
    }

    fn upload_bytes(&mut self, file_name: &str, mime_type: &str, bytes: Bytes) -> Result<String> {
        // File names may contain non-ASCII characters, which are sent as raw UTF-8
        let file_name = HeaderValue::from_bytes(file_name.as_bytes())
            .context("File name cannot be sent in a header")?;

        let mime_type = HeaderValue::from_str(mime_type).context("Invalid MIME type")?;

        let uri = format!("{API_URI}/uploads");

        let res = self.send(|http| raw_upload(http, &uri, &file_name, &mime_type, &bytes))?;

        let status = res.status();
        let body = res.text().context("Failed to read the upload response")?;

        upload_token_from(status, body)
    }

    fn create_media_item(
        &mut self,
        album_id: &str,
        upload_token: &str,
    ) -> Result<Vec<NewMediaItemResult>> {
        let res = self.send(|http| {
            http.post(format!("{API_URI}/mediaItems:batchCreate"))
                .json(&json!({
                    "albumId": album_id,
                    "newMediaItems": [{
                        "description": "",
                        "simpleMediaItem": { "uploadToken": upload_token },
                    }],
                }))
        })?;

        decode_json::<BatchCreateResponse>(res).map(|res| res.new_media_item_results)
    }

    fn set_description(&mut self, media_item_id: &str, description: &str) -> Result<()> {
        let res = self.send(|http| {
            http.patch(format!("{API_URI}/mediaItems/{media_item_id}"))
                .query(&[("updateMask", "description")])
                .json(&json!({ "description": description }))
        })?;

        decode_json::<Value>(res).map(|_| ())
    }
}

/// Build a raw upload request; cloning `bytes` doesn't copy the payload
fn raw_upload(
    http: &Client,
    uri: &str,
    file_name: &HeaderValue,
    mime_type: &HeaderValue,
    bytes: &Bytes,
) -> RequestBuilder {
    http.post(uri)
        .header(CONTENT_TYPE, "application/octet-stream")
        .header("X-Goog-Upload-Protocol", "raw")
        .header("X-Goog-Upload-File-Name", file_name.clone())
        .header("X-Goog-Upload-Content-Type", mime_type.clone())
        .body(bytes.clone())
}

/// Anything other than a 200 with a non-empty body is a rejected upload
fn upload_token_from(status: StatusCode, body: String) -> Result<String> {
    if status != StatusCode::OK || body.is_empty() {
        bail!("Server response - {status}: {body}");
    }

    Ok(body)
}

/// Decode a JSON response, turning `{ "error": ... }` payloads into errors
fn decode_json<T: DeserializeOwned>(res: Response) -> Result<T> {
    let status = res.status();
    let body = res.text().context("Failed to read the server response")?;

    debug!("Server response: {}", body);

    decode_body(status, &body)
}

fn decode_body<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T> {
    let value = serde_json::from_str::<Value>(body)
        .with_context(|| format!("Server returned an invalid response ({status}): {body}"))?;

    if let Some(error) = value.get("error") {
        match serde_json::from_value::<ApiError>(error.clone()) {
            Ok(err) => return Err(err.into()),
            Err(_) => bail!("Server returned an error ({status}): {body}"),
        }
    }

    serde_json::from_value(value)
        .with_context(|| format!("Unexpected server response ({status}): {body}"))
}
