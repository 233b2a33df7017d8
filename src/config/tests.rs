use super::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[cfg(test)]
mod integration_tests {
    use super::*;

    fn ollama(protocol: &str, host: &str, port: u16) -> OllamaConfig {
        OllamaConfig {
            protocol: protocol.to_string(),
            host: host.to_string(),
            port,
            model: "test".to_string(),
            batch_size: 32,
            embedding_dimension: 768,
        }
    }

    #[test]
    fn config_file_persistence() {
        let temp_dir = TempDir::new().expect("should create TempDir successfully");
        let config_path = temp_dir.path().join("config.toml");

        let original_config = Config {
            store: StoreConfig {
                database: "crm".to_string(),
                collection: "leads".to_string(),
                path: Some(PathBuf::from("exports/leads.jsonl")),
            },
            query: QueryConfig {
                default_limit: 50,
                allowed_fields: vec!["name".to_string(), "city".to_string()],
            },
            ollama: ollama("https", "test-host", 8080),
            ..Config::default()
        };

        let toml_content = toml::to_string_pretty(&original_config)
            .expect("config should convert to toml string successfully");
        fs::write(&config_path, toml_content).expect("should write to config_path successfully");

        let content =
            fs::read_to_string(&config_path).expect("should read from config_path successfully");
        let loaded_config: Config = toml::from_str(&content).expect("should parse toml correctly");

        assert_eq!(original_config, loaded_config);
    }

    #[test]
    fn load_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().expect("should create TempDir successfully");
        let config = Config::load(temp_dir.path()).expect("missing config should load defaults");

        assert_eq!(config.store, StoreConfig::default());
        assert_eq!(config.get_base_dir(), temp_dir.path());
    }

    #[test]
    fn save_then_load() {
        let temp_dir = TempDir::new().expect("should create TempDir successfully");
        let config_dir = temp_dir.path().join(".doc-query");

        let mut config = Config::load(&config_dir).expect("should load defaults");
        config.search.set_k(3).expect("k of 3 is valid");
        config.save().expect("should save config");

        assert!(config_dir.join("config.toml").exists());
        let loaded = Config::load(&config_dir).expect("should load saved config");
        assert_eq!(loaded.search.k, 3);
        assert_eq!(loaded, config);
    }

    #[test]
    fn load_rejects_invalid_values() {
        let temp_dir = TempDir::new().expect("should create TempDir successfully");
        fs::write(
            temp_dir.path().join("config.toml"),
            "[query]\ndefault_limit = 0\n",
        )
        .expect("should write config");

        assert!(Config::load(temp_dir.path()).is_err());
    }

    #[test]
    fn invalid_toml_handling() {
        let invalid_toml = r#"
            [ollama
            host = "localhost"
            port = "invalid_port"
        "#;

        let result: Result<Config, toml::de::Error> = toml::from_str(invalid_toml);
        assert!(result.is_err());
    }

    #[test]
    fn partial_config_with_defaults() {
        let partial_toml = r#"
            [ollama]
            host = "custom-host"

            [store]
            collection = "leads"
        "#;

        let config: Config = toml::from_str(partial_toml).expect("partial config should parse");
        assert_eq!(config.ollama.host, "custom-host");
        assert_eq!(config.ollama.port, 11434);
        assert_eq!(config.store.database, "test");
        assert_eq!(config.store.collection, "leads");
        assert_eq!(config.query.default_limit, 200);
        assert!(config.search.enabled);
    }

    #[test]
    fn collection_path_resolution() {
        let mut config = Config {
            base_dir: PathBuf::from("/srv/doc-query"),
            ..Config::default()
        };
        assert_eq!(
            config.collection_path(),
            PathBuf::from("/srv/doc-query/data/test/baffle_collection.json")
        );

        config.store.path = Some(PathBuf::from("leads.jsonl"));
        assert_eq!(
            config.collection_path(),
            PathBuf::from("/srv/doc-query/leads.jsonl")
        );

        config.store.path = Some(PathBuf::from("/data/leads.json"));
        assert_eq!(config.collection_path(), PathBuf::from("/data/leads.json"));
    }

    #[test]
    fn field_policy_follows_query_section() {
        let mut config = Config::default();
        config.query.allowed_fields = vec!["name".to_string()];
        config.query.default_limit = 7;

        let policy = config.field_policy();
        assert!(policy.is_allowed("name"));
        assert!(!policy.is_allowed("salary"));

        config.query.allowed_fields.clear();
        assert!(config.field_policy().is_allowed("salary"));
    }

    #[test]
    fn config_validation_edge_cases() {
        let config = Config {
            ollama: ollama("http", "", 80),
            ..Config::default()
        };
        assert!(config.validate().is_err()); // Empty host should be invalid

        let mut config = Config::default();
        config.store.collection = "../escape".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidStoreName("collection", _))
        ));

        let mut config = Config::default();
        config.search.num_candidates = 2;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::CandidatesBelowK(2, 5))
        ));
    }

    #[test]
    fn ollama_url_generation_with_different_hosts() {
        let configs = vec![
            ("http", "localhost", 11434, "http://localhost:11434/"),
            ("http", "127.0.0.1", 8080, "http://127.0.0.1:8080/"),
            ("http", "example.com", 3000, "http://example.com:3000/"),
            (
                "https",
                "secure.example.com",
                443,
                "https://secure.example.com/",
            ),
        ];

        for (protocol, host, port, expected_url) in configs {
            let config = Config {
                ollama: ollama(protocol, host, port),
                ..Config::default()
            };

            let url = config.ollama_url().expect("ollama_url is ok");
            assert_eq!(url.as_str(), expected_url);
        }
    }

    #[test]
    fn error_display_messages() {
        let errors = vec![
            ConfigError::InvalidProtocol("ftp".to_string()),
            ConfigError::InvalidPort(0),
            ConfigError::InvalidBatchSize(0),
            ConfigError::InvalidModel(String::new()),
            ConfigError::InvalidUrl("invalid-url".to_string()),
            ConfigError::InvalidDefaultLimit(0),
            ConfigError::InvalidSearchK(0),
            ConfigError::EmptyEmbeddingField,
        ];

        for error in errors {
            let message = format!("{error}");
            assert!(message.len() > 10); // Ensure meaningful error messages
        }
    }
}
