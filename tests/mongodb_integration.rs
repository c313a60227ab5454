//! Integration tests for the MongoDB backend
//!
//! Tests that need a server are ignored by default. Start one and run:
//!
//!   docker run -d -p 27017:27017 --name pipefile-mongo mongo:7
//!   cargo test --features storage-mongodb --test mongodb_integration -- --ignored --nocapture
//!
//! Set PIPEFILE_TEST_MONGO_URI to point at a different server.

#[cfg(feature = "storage-mongodb")]
mod tests {
    use pipefile_storage::storage::{
        MongoStorage, MongoStorageConfig, Storage, StorageErrorKind,
    };
    use mongodb::bson::{doc, Document};
    use std::error::Error as _;
    use std::sync::Arc;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    const TEST_DB: &str = "pipefile";
    const TEST_COLLECTION: &str = "pipefile";

    fn test_uri() -> String {
        std::env::var("PIPEFILE_TEST_MONGO_URI")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string())
    }

    fn test_config() -> MongoStorageConfig {
        MongoStorageConfig::new()
            .with_uri(test_uri())
            .with_database(TEST_DB)
            .with_collection(TEST_COLLECTION)
            .without_authentication()
            .with_server_selection_timeout(Duration::from_secs(5))
    }

    /// Key unique to this run so reruns never collide on the unique index
    fn unique_key(name: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        format!("{}-{}-{}", name, std::process::id(), nanos)
    }

    async fn open() -> MongoStorage {
        match MongoStorage::open(test_config()).await {
            Ok(storage) => storage,
            Err(e) => {
                eprintln!("Failed to open backend: {:?}", e);
                eprintln!("Make sure MongoDB is running:");
                eprintln!("  docker run -d -p 27017:27017 --name pipefile-mongo mongo:7");
                panic!("Backend creation failed");
            }
        }
    }

    #[tokio::test]
    async fn test_unreachable_server_fails_with_connection_error() {
        let config = MongoStorageConfig::new()
            .with_uri("mongodb://127.0.0.1:1")
            .with_server_selection_timeout(Duration::from_millis(200));

        let err = MongoStorage::open(config).await.unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::ConnectionFailure);
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB instance
    async fn test_put_get_roundtrip() {
        let storage = open().await;
        let key_a = unique_key("a");
        let key_b = unique_key("b");

        storage.put(&key_a, &[1, 2, 3]).await.expect("Failed to put");
        assert_eq!(storage.get(&key_a).await.expect("Failed to get"), vec![1, 2, 3]);

        let err = storage.get(&key_b).await.unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::NotFound);

        storage.close().await.unwrap();
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB instance
    async fn test_binary_payload_is_stored_verbatim() {
        let storage = open().await;
        let key = unique_key("binary");
        let payload: Vec<u8> = (0..=255u8).cycle().take(64 * 1024).collect();

        storage.put(&key, &payload).await.unwrap();
        assert_eq!(storage.get(&key).await.unwrap(), payload);

        storage.close().await.unwrap();
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB instance
    async fn test_duplicate_key_rejected() {
        let storage = open().await;
        let key = unique_key("dup");

        storage.put(&key, b"first").await.unwrap();
        let err = storage.put(&key, b"second").await.unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::DuplicateKey);
        assert_eq!(storage.get(&key).await.unwrap(), b"first");

        storage.close().await.unwrap();
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB instance
    async fn test_index_failure_aborts_open() {
        let collection_name = unique_key("index_conflict");
        let client = mongodb::Client::with_uri_str(test_uri())
            .await
            .expect("Failed to create client");
        let raw = client
            .database(TEST_DB)
            .collection::<Document>(&collection_name);

        // Existing duplicates make the unique index impossible to build
        raw.insert_many(vec![
            doc! { "key": "same", "file_data": "x" },
            doc! { "key": "same", "file_data": "y" },
        ])
        .await
        .expect("Failed to seed duplicates");

        let result = MongoStorage::open(test_config().with_collection(&collection_name)).await;
        let err = result.expect_err("open must fail without the unique index");
        assert_eq!(err.kind(), StorageErrorKind::IndexFailure);
        assert!(err.source().is_some());

        raw.drop().await.expect("Failed to drop collection");
        client.shutdown().await;
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB instance
    async fn test_undecodable_record_is_unknown_error() {
        let storage = open().await;
        let key = unique_key("undecodable");

        storage
            .client()
            .database(TEST_DB)
            .collection::<Document>(TEST_COLLECTION)
            .insert_one(doc! { "key": key.as_str(), "file_data": "not-binary" })
            .await
            .expect("Failed to insert malformed record");

        let err = storage.get(&key).await.unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::Unknown);
        assert!(err.source().is_some());

        storage
            .client()
            .database(TEST_DB)
            .collection::<Document>(TEST_COLLECTION)
            .delete_one(doc! { "key": key.as_str() })
            .await
            .expect("Failed to clean up");
        storage.close().await.unwrap();
    }

    #[cfg(feature = "config")]
    #[tokio::test]
    #[ignore] // Requires MongoDB instance
    async fn test_settings_without_authentication_open() {
        use pipefile_storage::config::{MongoSettings, StorageSettings};

        let settings = StorageSettings {
            mongodb: MongoSettings {
                uri: Some(test_uri()),
                database: Some(TEST_DB.to_string()),
                collection: Some(TEST_COLLECTION.to_string()),
                authentication: Some(false),
                ..Default::default()
            },
            ..Default::default()
        };

        let storage = settings.open().await.expect("Failed to open from settings");
        assert_eq!(storage.backend_type(), "mongodb");
        storage.close().await.unwrap();
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB instance
    async fn test_reopen_keeps_index() {
        // Index creation is idempotent, so a second open on the same
        // collection succeeds and sees the first handle's writes.
        let first = open().await;
        let key = unique_key("reopen");
        first.put(&key, b"data").await.unwrap();
        first.close().await.unwrap();

        let second = open().await;
        assert_eq!(second.get(&key).await.unwrap(), b"data");
        second.close().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[ignore] // Requires MongoDB instance
    async fn test_concurrent_puts_from_two_instances() {
        let first = Arc::new(open().await);
        let second = Arc::new(open().await);
        let key_one = unique_key("concurrent-one");
        let key_two = unique_key("concurrent-two");

        let (one, two) = tokio::join!(
            {
                let storage = Arc::clone(&first);
                let key = key_one.clone();
                tokio::spawn(async move { storage.put(&key, b"one").await })
            },
            {
                let storage = Arc::clone(&second);
                let key = key_two.clone();
                tokio::spawn(async move { storage.put(&key, b"two").await })
            }
        );
        one.unwrap().unwrap();
        two.unwrap().unwrap();

        assert_eq!(first.get(&key_two).await.unwrap(), b"two");
        assert_eq!(second.get(&key_one).await.unwrap(), b"one");

        first.close().await.unwrap();
        second.close().await.unwrap();
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB instance
    async fn test_operations_after_close_fail_fast() {
        let storage = open().await;
        storage.close().await.unwrap();

        let key = unique_key("closed");
        assert_eq!(
            storage.put(&key, b"data").await.unwrap_err().kind(),
            StorageErrorKind::Closed
        );
        assert_eq!(
            storage.get(&key).await.unwrap_err().kind(),
            StorageErrorKind::Closed
        );
        assert_eq!(
            storage.close().await.unwrap_err().kind(),
            StorageErrorKind::Closed
        );
    }
}
