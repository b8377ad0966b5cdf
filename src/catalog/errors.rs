use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Catalog error: malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Catalog error: the catalog does not declare a category taxonomy")]
    MissingTaxonomy,
    #[error("Catalog error: loader failed: {0}")]
    Loader(String)
}
