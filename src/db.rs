use anyhow::{Context, Result};
use futures::TryStreamExt;
use mongodb::options::{ClientOptions, FindOptions, IndexOptions, ReplaceOptions};
use mongodb::{
    Client, Collection, Database as MongoDatabase, IndexModel,
    bson::{Document, Regex, doc},
};
use once_cell::sync::OnceCell;
use serde::{Serialize, de::DeserializeOwned};

use crate::config::CONFIG;
use crate::data_models::Product;
use crate::errors::StoreError;
use crate::store::{RelationalStore, StoreFilter};

/// Global database instance
static DB: OnceCell<Database> = OnceCell::new();

/// Collection names as constants for consistency
pub mod collections {
    pub const PRODUCTS: &str = "products";
}

/// Main database wrapper providing connection management and collection access
#[derive(Debug, Clone)]
pub struct Database {
    client: Client,
    db: MongoDatabase,
}

impl Database {
    /// Connect and verify the connection with a ping.
    pub async fn new(uri: &str, db_name: &str) -> Result<Self> {
        let client_options = ClientOptions::parse(uri)
            .await
            .context("Failed to parse MongoDB connection string")?;

        let client =
            Client::with_options(client_options).context("Failed to create MongoDB client")?;

        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .context("Failed to connect to MongoDB")?;

        log::info!("Connected to MongoDB database: {}", db_name);

        let db = client.database(db_name);

        Ok(Self { client, db })
    }

    /// Create a Database instance using environment configuration
    pub async fn from_config() -> Result<Self> {
        Self::new(&CONFIG.mongo_uri, &CONFIG.mongo_db_name).await
    }

    /// Initialize the global database instance.
    /// Call this once at application startup.
    pub async fn init_global() -> Result<&'static Database> {
        let db = Self::from_config().await?;
        DB.set(db)
            .map_err(|_| anyhow::anyhow!("Database already initialized"))?;
        Self::try_get()
    }

    /// Get the global database instance, if initialized.
    pub fn try_get() -> Result<&'static Database> {
        DB.get().ok_or_else(|| {
            anyhow::anyhow!("Database not initialized. Call Database::init_global() first.")
        })
    }

    /// Get a typed collection by name
    pub fn collection<T>(&self, name: &str) -> Collection<T>
    where
        T: Send + Sync,
    {
        self.db.collection(name)
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn products(&self) -> Collection<Product> {
        self.collection(collections::PRODUCTS)
    }
}

// =============================================================================
// Generic read/write helpers
// =============================================================================

/// Typed access to one collection, keyed by the documents' `id` field.
pub struct Repository<T>
where
    T: Send + Sync,
{
    collection: Collection<T>,
}

impl<T> Repository<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    pub fn new(collection: Collection<T>) -> Self {
        Self { collection }
    }

    pub async fn find_by_key(&self, id: &str) -> Result<Option<T>, StoreError> {
        Ok(self.collection.find_one(doc! { "id": id }).await?)
    }

    /// Find documents matching a filter with an explicit sort and limit.
    pub async fn find_sorted(
        &self,
        filter: Document,
        sort: Document,
        limit: i64,
    ) -> Result<Vec<T>, StoreError> {
        let options = FindOptions::builder().sort(sort).limit(limit).build();
        let cursor = self.collection.find(filter).with_options(options).await?;
        Ok(cursor.try_collect().await?)
    }

    /// Insert or replace the document whose `id` equals `id`.
    pub async fn replace_by_key(&self, id: &str, document: &T) -> Result<(), StoreError> {
        let options = ReplaceOptions::builder().upsert(true).build();
        self.collection
            .replace_one(doc! { "id": id }, document)
            .with_options(options)
            .await?;
        Ok(())
    }

    pub async fn delete_by_key(&self, id: &str) -> Result<bool, StoreError> {
        let result = self.collection.delete_one(doc! { "id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    pub async fn count(&self, filter: Document) -> Result<u64, StoreError> {
        Ok(self.collection.count_documents(filter).await?)
    }
}

// =============================================================================
// Product-specific operations
// =============================================================================

/// MongoDB-backed [`RelationalStore`].
pub struct ProductRepo {
    repo: Repository<Product>,
}

impl ProductRepo {
    pub fn new(db: &Database) -> Self {
        Self {
            repo: Repository::new(db.products()),
        }
    }

    /// Unique `id` plus the fields the fallback and featured scans filter on.
    pub async fn ensure_indexes(&self) -> Result<()> {
        let unique = IndexOptions::builder().unique(true).build();
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "id": 1 })
                .options(unique)
                .build(),
            IndexModel::builder().keys(doc! { "category_id": 1 }).build(),
            IndexModel::builder().keys(doc! { "price": 1 }).build(),
            IndexModel::builder()
                .keys(doc! { "rating": -1, "popularity": -1 })
                .build(),
        ];
        self.repo
            .collection
            .create_indexes(indexes)
            .await
            .context("Failed to create product indexes")?;
        Ok(())
    }

    pub async fn count(&self) -> Result<u64, StoreError> {
        self.repo.count(doc! {}).await
    }
}

/// Translate a scan filter into a MongoDB query document.
pub fn filter_document(filter: &StoreFilter) -> Document {
    let mut query = Document::new();

    if let Some(text) = &filter.text {
        let pattern = Regex {
            pattern: regex::escape(text),
            options: "i".to_string(),
        };
        query.insert(
            "$or",
            vec![
                doc! { "title": pattern.clone() },
                doc! { "brand": pattern },
            ],
        );
    }

    if let Some(category_id) = &filter.category_id {
        query.insert("category_id", category_id.as_str());
    }

    let mut price = Document::new();
    if let Some(min) = filter.min_price {
        price.insert("$gte", min);
    }
    if let Some(max) = filter.max_price {
        price.insert("$lte", max);
    }
    if !price.is_empty() {
        query.insert("price", price);
    }

    query
}

impl RelationalStore for ProductRepo {
    async fn query_by_filter(&self, filter: &StoreFilter) -> Result<Vec<Product>, StoreError> {
        self.repo
            .find_sorted(filter_document(filter), doc! { "id": 1 }, filter.limit)
            .await
    }

    async fn read_by_id(&self, id: &str) -> Result<Option<Product>, StoreError> {
        self.repo.find_by_key(id).await
    }

    async fn featured(&self, limit: i64) -> Result<Vec<Product>, StoreError> {
        self.repo
            .find_sorted(
                doc! { "stock": { "$gt": 0 } },
                doc! { "rating": -1, "popularity": -1, "id": 1 },
                limit,
            )
            .await
    }

    async fn by_category(&self, category_id: &str, limit: i64) -> Result<Vec<Product>, StoreError> {
        self.repo
            .find_sorted(
                doc! { "category_id": category_id, "stock": { "$gt": 0 } },
                doc! { "id": 1 },
                limit,
            )
            .await
    }

    async fn upsert(&self, product: &Product) -> Result<(), StoreError> {
        self.repo.replace_by_key(&product.id, product).await
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        self.repo.delete_by_key(id).await
    }
}

// =============================================================================
// Test utilities
// =============================================================================
