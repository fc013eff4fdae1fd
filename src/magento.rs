// Catalog client: one method per remote procedure of Magento's
// `catalog_product`, `catalog_product_attribute_media` and
// `catalog_category` resources. Methods only shape their arguments into
// the positional list the procedure expects and hand them to the
// connection; responses come back exactly as the server sent them.

use crate::config::MagentoConfig;
use crate::connection::MagentoConnection;
use crate::error::{MagentoError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use serde_json::{json, Value};
use std::path::Path;

/// Mime type sent for every uploaded image unless overridden.
pub const LEGACY_IMAGE_MIME: &str = "image/jpeg";

/// Settings for `add_image_to_product`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageOptions {
    /// Hide the image on the product page.
    pub exclude: bool,
    pub position: i64,
    /// Roles such as `image`, `small_image`, `thumbnail`.
    pub types: Vec<String>,
    /// Defaults to `image/jpeg` whatever the file holds; see `infer_mime`.
    pub mime: String,
}

impl Default for ImageOptions {
    fn default() -> Self {
        ImageOptions {
            exclude: false,
            position: 0,
            types: Vec::new(),
            mime: LEGACY_IMAGE_MIME.to_string(),
        }
    }
}

impl ImageOptions {
    pub fn exclude(mut self, exclude: bool) -> Self {
        self.exclude = exclude;
        self
    }

    pub fn position(mut self, position: i64) -> Self {
        self.position = position;
        self
    }

    pub fn types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = mime.into();
        self
    }

    /// Picks the mime type from the file extension. Unknown extensions keep
    /// the current value.
    pub fn infer_mime(mut self, path: impl AsRef<Path>) -> Self {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let mime = match ext.as_deref() {
            Some("png") => "image/png",
            Some("gif") => "image/gif",
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("webp") => "image/webp",
            _ => return self,
        };
        self.mime = mime.to_string();
        self
    }
}

#[derive(Serialize)]
struct ImageFile<'a> {
    content: String,
    mime: &'a str,
}

#[derive(Serialize)]
struct ImageData<'a> {
    exclude: bool,
    position: i64,
    types: &'a [String],
    file: ImageFile<'a>,
}

/// Magento catalog API client.
#[derive(Debug)]
pub struct Magento {
    conn: MagentoConnection,
}

impl Magento {
    /// Connects and logs in with the given endpoint and API credentials.
    pub fn connect(url: &str, username: &str, api_key: &str) -> Result<Self> {
        Ok(Magento {
            conn: MagentoConnection::open_with(url, username, api_key)?,
        })
    }

    pub fn open(config: MagentoConfig) -> Result<Self> {
        Ok(Magento {
            conn: MagentoConnection::open(config)?,
        })
    }

    /// Wraps an existing connection, logged in or not.
    pub fn from_connection(conn: MagentoConnection) -> Self {
        Magento { conn }
    }

    pub fn connection(&self) -> &MagentoConnection {
        &self.conn
    }

    /// Raw access to any remote procedure.
    pub fn call(&self, procedure: &str, args: Vec<Value>) -> Result<Value> {
        self.conn.call(procedure, args)
    }

    // Product operations

    /// Fetches the product data for `sku`.
    pub fn get_product_info(&self, sku: &str) -> Result<Value> {
        self.call("catalog_product.info", vec![json!(sku)])
    }

    /// Updates the product with the given `sku` using the fields in `product_data`.
    pub fn update_product_data(&self, sku: &str, product_data: &Value) -> Result<Value> {
        self.call("catalog_product.update", vec![json!(sku), product_data.clone()])
    }

    // Image operations

    /// Lists the media gallery entries of a product.
    pub fn get_images_of_product(&self, sku: &str) -> Result<Value> {
        self.call("catalog_product_attribute_media.list", vec![json!(sku)])
    }

    /// Updates the gallery entry stored under `image_location` (the `file`
    /// value returned by `get_images_of_product`). `image_data` carries the
    /// fields to change, e.g. `{"label": .., "types": [..]}`.
    pub fn update_image_of_product(
        &self,
        sku: &str,
        image_location: &str,
        image_data: Option<&Value>,
    ) -> Result<Value> {
        let mut args = vec![json!(sku), json!(image_location)];
        if let Some(data) = image_data {
            args.push(data.clone());
        }
        self.call("catalog_product_attribute_media.update", args)
    }

    /// Removes the gallery image stored under `image_location`.
    pub fn remove_image_of_product(&self, sku: &str, image_location: &str) -> Result<Value> {
        self.call(
            "catalog_product_attribute_media.remove",
            vec![json!(sku), json!(image_location)],
        )
    }

    /// Uploads the file at `image_path` as a new gallery image. The file is
    /// read whole and sent base64-encoded; a read failure aborts before any
    /// request is made.
    pub fn add_image_to_product(
        &self,
        sku: &str,
        image_path: impl AsRef<Path>,
        options: &ImageOptions,
    ) -> Result<Value> {
        let path = image_path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| MagentoError::FileAccess {
            path: path.to_path_buf(),
            source,
        })?;

        let image_data = ImageData {
            exclude: options.exclude,
            position: options.position,
            types: &options.types,
            file: ImageFile {
                content: STANDARD.encode(&bytes),
                mime: &options.mime,
            },
        };
        let image_data = serde_json::to_value(&image_data)
            .map_err(|e| MagentoError::protocol(format!("cannot encode image data: {e}")))?;
        self.call(
            "catalog_product_attribute_media.create",
            vec![json!(sku), image_data],
        )
    }

    // Category operations

    /// Creates a category below `parent_category_id`; returns the new id.
    pub fn create_category(&self, parent_category_id: i64, category_data: &Value) -> Result<Value> {
        self.call(
            "catalog_category.create",
            vec![json!(parent_category_id), category_data.clone()],
        )
    }

    /// Assigns the product to a category.
    pub fn assign_product(&self, category_id: i64, product_sku: &str) -> Result<Value> {
        self.call(
            "catalog_category.assignProduct",
            vec![json!(category_id), json!(product_sku)],
        )
    }

    /// Updates a category with the fields in `category_data`.
    pub fn update_category(&self, category_id: i64, category_data: &Value) -> Result<Value> {
        self.call(
            "catalog_category.update",
            vec![json!(category_id), category_data.clone()],
        )
    }

    /// Moves a category under another parent.
    pub fn move_category(&self, category_id: i64, parent_id: i64) -> Result<Value> {
        self.call(
            "catalog_category.move",
            vec![json!(category_id), json!(parent_id)],
        )
    }

    /// Retrieves the category tree below `parent_id`.
    pub fn tree_category(&self, parent_id: i64) -> Result<Value> {
        self.call("catalog_category.tree", vec![json!(parent_id)])
    }

    /// Lists the products assigned to a category in the given store.
    pub fn assigned_products(&self, category_id: i64, store_id: i64) -> Result<Value> {
        self.call(
            "catalog_category.assignedProducts",
            vec![json!(category_id), json!(store_id)],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_options_defaults() {
        let options = ImageOptions::default();
        assert!(!options.exclude);
        assert_eq!(options.position, 0);
        assert!(options.types.is_empty());
        assert_eq!(options.mime, "image/jpeg");
    }

    #[test]
    fn test_default_types_are_not_shared() {
        let mut first = ImageOptions::default();
        first.types.push("image".into());
        assert!(ImageOptions::default().types.is_empty());
    }

    #[test]
    fn test_infer_mime_from_extension() {
        assert_eq!(ImageOptions::default().infer_mime("a/b.PNG").mime, "image/png");
        assert_eq!(ImageOptions::default().infer_mime("b.gif").mime, "image/gif");
        assert_eq!(ImageOptions::default().infer_mime("c.jpeg").mime, "image/jpeg");
        assert_eq!(ImageOptions::default().infer_mime("d.webp").mime, "image/webp");
    }

    #[test]
    fn test_infer_mime_keeps_value_for_unknown_extension() {
        let options = ImageOptions::default().mime("image/tiff").infer_mime("scan.dat");
        assert_eq!(options.mime, "image/tiff");
        let options = ImageOptions::default().infer_mime("no_extension");
        assert_eq!(options.mime, LEGACY_IMAGE_MIME);
    }

    #[test]
    fn test_builder_setters() {
        let options = ImageOptions::default()
            .exclude(true)
            .position(3)
            .types(["image", "thumbnail"]);
        assert!(options.exclude);
        assert_eq!(options.position, 3);
        assert_eq!(options.types, vec!["image".to_string(), "thumbnail".to_string()]);
    }

    #[test]
    fn test_missing_image_is_file_access_error_without_connection() {
        let conn = MagentoConnection::new(MagentoConfig::new("http://127.0.0.1:9/", "u", "k")).unwrap();
        let magento = Magento::from_connection(conn);
        let err = magento
            .add_image_to_product("SKU1", "/definitely/not/here.jpg", &ImageOptions::default())
            .unwrap_err();
        assert!(matches!(err, MagentoError::FileAccess { .. }));
    }
}
