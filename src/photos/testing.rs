use std::collections::{HashMap, HashSet};

use anyhow::{bail, Context, Result};
use bytes::Bytes;

use super::{Album, ItemStatus, MediaItem, NewMediaItemResult, Page, PhotosLibrary};

/// In-memory Photos library
pub struct FakeLibrary {
    albums: Vec<(Album, bool)>,
    items: HashMap<String, Vec<MediaItem>>,
    page_size: usize,
    next_id: usize,

    pub fail_listing: bool,
    pub rejected_uploads: HashSet<String>,
    pub failing_items: HashSet<String>,
    pub rejected_albums: HashSet<String>,

    pub created_albums: Vec<String>,
    pub uploads: Vec<String>,
    pub created_items: Vec<(String, String)>,
    pub descriptions: Vec<(String, String)>,
    pub search_requests: usize,
}

impl FakeLibrary {
    pub fn new() -> Self {
        Self::with_page_size(50)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            albums: vec![],
            items: HashMap::new(),
            page_size,
            next_id: 0,
            fail_listing: false,
            rejected_uploads: HashSet::new(),
            failing_items: HashSet::new(),
            rejected_albums: HashSet::new(),
            created_albums: vec![],
            uploads: vec![],
            created_items: vec![],
            descriptions: vec![],
            search_requests: 0,
        }
    }

    fn new_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    pub fn add_album(&mut self, title: &str, app_created: bool) -> String {
        let id = self.new_id("album");

        self.albums.push((
            Album {
                id: id.clone(),
                title: title.to_owned(),
                media_items_count: None,
                is_writeable: app_created,
            },
            app_created,
        ));

        self.items.insert(id.clone(), vec![]);

        id
    }

    pub fn add_item(&mut self, album_id: &str, filename: &str) -> String {
        let id = self.new_id("item");

        self.items
            .get_mut(album_id)
            .expect("unknown album")
            .push(MediaItem {
                id: id.clone(),
                filename: Some(filename.to_owned()),
                description: None,
                product_url: Some(format!("https://photos.example/{id}")),
            });

        id
    }

    fn paginate<T: Clone>(&self, all: &[T], page_token: Option<&str>) -> Result<Page<T>> {
        let start = match page_token {
            None => 0,
            Some(token) => token.parse::<usize>().context("bad page token")?,
        };

        let end = (start + self.page_size).min(all.len());

        Ok(Page {
            items: all[start..end].to_vec(),
            next_page_token: (end < all.len()).then(|| end.to_string()),
        })
    }
}

impl PhotosLibrary for FakeLibrary {
    fn list_albums(
        &mut self,
        app_created_only: bool,
        page_token: Option<&str>,
    ) -> Result<Page<Album>> {
        if self.fail_listing {
            bail!("error: 500; INTERNAL; listing failed");
        }

        let albums = self
            .albums
            .iter()
            .filter(|(_, app_created)| *app_created || !app_created_only)
            .map(|(album, _)| album.clone())
            .collect::<Vec<_>>();

        self.paginate(&albums, page_token)
    }

    fn create_album(&mut self, title: &str) -> Result<Album> {
        if self.rejected_albums.contains(title) {
            bail!("error: 400; INVALID_ARGUMENT; album rejected");
        }

        let id = self.add_album(title, true);
        self.created_albums.push(title.to_owned());

        Ok(self
            .albums
            .iter()
            .find(|(album, _)| album.id == id)
            .map(|(album, _)| album.clone())
            .unwrap())
    }

    fn search_album(&mut self, album_id: &str, page_token: Option<&str>) -> Result<Page<MediaItem>> {
        self.search_requests += 1;

        let items = self.items.get(album_id).context("unknown album")?.clone();
        self.paginate(&items, page_token)
    }

    fn upload_bytes(&mut self, file_name: &str, _mime_type: &str, _bytes: Bytes) -> Result<String> {
        self.uploads.push(file_name.to_owned());

        if self.rejected_uploads.contains(file_name) {
            bail!("Server responded with 400 Bad Request");
        }

        Ok(format!("token:{file_name}"))
    }

    fn create_media_item(
        &mut self,
        album_id: &str,
        upload_token: &str,
    ) -> Result<Vec<NewMediaItemResult>> {
        let file_name = upload_token.trim_start_matches("token:").to_owned();
        self.created_items
            .push((album_id.to_owned(), file_name.clone()));

        if self.failing_items.contains(&file_name) {
            return Ok(vec![NewMediaItemResult {
                status: ItemStatus {
                    code: Some(3),
                    message: Some("Failed: invalid media".to_owned()),
                },
                media_item: None,
            }]);
        }

        let id = self.add_item(album_id, &file_name);
        let item = self.items[album_id]
            .iter()
            .find(|item| item.id == id)
            .cloned();

        Ok(vec![NewMediaItemResult {
            status: ItemStatus {
                code: None,
                message: Some("Success".to_owned()),
            },
            media_item: item,
        }])
    }

    fn set_description(&mut self, media_item_id: &str, description: &str) -> Result<()> {
        self.descriptions
            .push((media_item_id.to_owned(), description.to_owned()));

        Ok(())
    }
}
