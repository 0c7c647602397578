use anyhow::{Context, bail};
use data_storage::config::DataStorageConfig;
use data_storage::document::{DocumentType, ListOptions, StoredDocument};
use data_storage::partition::StaticIdentity;
use data_storage::storage::DataStorage;
use serde_json::{Value, json};
use std::sync::Arc;
use uuid::Uuid;

const ENV_USER_ID: &str = "DATA_STORAGE_USER_ID";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let program = program_name(&args);

    if args.len() < 3 {
        print_usage(program);
        std::process::exit(1);
    }

    let mut config_file: Option<String> = None;
    let mut url: Option<String> = None;
    let mut database: Option<String> = None;
    let mut collection: Option<String> = None;
    let mut token: Option<String> = None;
    let mut user_id: Option<String> = std::env::var(ENV_USER_ID).ok();
    let mut page_size: Option<u32> = None;
    let mut continuation: Option<String> = None;
    let mut if_match: Option<String> = None;
    let mut all_pages = false;
    let mut positional: Vec<String> = vec![];

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                config_file = Some(flag_value(&args, i)?);
                i += 2;
            }
            "--url" => {
                url = Some(flag_value(&args, i)?);
                i += 2;
            }
            "--database" => {
                database = Some(flag_value(&args, i)?);
                i += 2;
            }
            "--collection" => {
                collection = Some(flag_value(&args, i)?);
                i += 2;
            }
            "--token" => {
                token = Some(flag_value(&args, i)?);
                i += 2;
            }
            "--user" => {
                user_id = Some(flag_value(&args, i)?);
                i += 2;
            }
            "--page-size" => {
                page_size = Some(flag_value(&args, i)?.parse()?);
                i += 2;
            }
            "--continuation" => {
                continuation = Some(flag_value(&args, i)?);
                i += 2;
            }
            "--if-match" => {
                if_match = Some(flag_value(&args, i)?);
                i += 2;
            }
            "--all" => {
                all_pages = true;
                i += 1;
            }
            _ => {
                positional.push(args[i].clone());
                i += 1;
            }
        }
    }

    // 1. Configuration: file or environment, then command-line overrides
    let mut config = match config_file {
        Some(path) => DataStorageConfig::from_file(&path)
            .with_context(|| format!("loading config from {}", path))?,
        None => DataStorageConfig::from_env()?,
    };
    if let Some(url) = url {
        config.base_url = url;
    }
    if let Some(database) = database {
        config.database = database;
    }
    if let Some(collection) = collection {
        config.collection = collection;
    }
    if token.is_some() {
        config.auth_token = token;
    }

    // 2. Client
    let identity = match user_id.filter(|id| !id.is_empty()) {
        Some(id) => StaticIdentity::new(id),
        None => StaticIdentity::anonymous(),
    };
    let storage = DataStorage::http(config, Arc::new(identity))?;
    tracing::info!(
        "Using {} ({}/{})",
        storage.config().base_url,
        storage.config().database,
        storage.config().collection
    );

    // 3. Command
    let command = positional.first().map(String::as_str).unwrap_or_default();
    let partition = positional.get(1).context("missing <partition>")?;
    let documents = DocumentType::<Value>::new();

    let output = match command {
        "read" => {
            let id = positional.get(2).context("missing <id>")?;
            let stored = storage.read(partition, id, documents).await.into_result()?;
            stored_to_json(&stored)
        }
        "list" => {
            let listed = if all_pages {
                storage.list_all(partition, documents).await
            } else {
                let options = ListOptions {
                    page_size,
                    continuation_token: continuation,
                };
                storage.list_page(partition, documents, options).await
            };
            let page = listed.into_result()?;
            let items: Vec<Value> = page
                .items
                .iter()
                .map(|item| match item.stored() {
                    Some(stored) => stored_to_json(stored),
                    None => json!({
                        "error": item.error().map(|e| e.to_string()),
                    }),
                })
                .collect();
            json!({
                "documents": items,
                "continuation": page.continuation_token,
            })
        }
        "create" => {
            let id = match positional.get(2).map(String::as_str) {
                Some("-") | None => Uuid::new_v4().to_string(),
                Some(id) => id.to_string(),
            };
            let document = parse_document(positional.get(3))?;
            let stored = storage
                .create(partition, &id, &document)
                .await
                .into_result()?;
            stored_to_json(&stored)
        }
        "replace" => {
            let id = positional.get(2).context("missing <id>")?;
            let document = parse_document(positional.get(3))?;
            let replaced = match &if_match {
                Some(etag) => storage.replace_if_match(partition, id, &document, etag).await,
                None => storage.replace(partition, id, &document).await,
            };
            stored_to_json(&replaced.into_result()?)
        }
        "delete" => {
            let id = positional.get(2).context("missing <id>")?;
            storage.delete(partition, id).await?;
            json!({ "deleted": id, "partition": partition })
        }
        other => {
            print_usage(program);
            bail!("unknown command '{}'", other);
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// argv[0], or the binary name when the platform passes an empty argv.
fn program_name(args: &[String]) -> &str {
    args.first().map(String::as_str).unwrap_or("data-storage")
}

fn flag_value(args: &[String], i: usize) -> anyhow::Result<String> {
    match args.get(i + 1) {
        Some(value) => Ok(value.clone()),
        None => bail!("{} expects a value", args[i]),
    }
}

fn parse_document(raw: Option<&String>) -> anyhow::Result<Value> {
    let raw = raw.context("missing <json> document")?;
    serde_json::from_str(raw).context("document is not valid JSON")
}

fn stored_to_json(stored: &StoredDocument<Value>) -> Value {
    json!({
        "id": stored.id,
        "partition": stored.partition,
        "etag": stored.etag,
        "lastUpdated": stored.last_updated,
        "document": stored.value,
    })
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} [options] <command> <partition> [args]", program);
    eprintln!("Commands:");
    eprintln!("  read <partition> <id>");
    eprintln!("  list <partition> [--page-size <n>] [--continuation <token>] [--all]");
    eprintln!("  create <partition> <id|-> <json>");
    eprintln!("  replace <partition> <id> <json> [--if-match <etag>]");
    eprintln!("  delete <partition> <id>");
    eprintln!("Options: --config <file> --url <url> --database <db> --collection <coll>");
    eprintln!("         --token <token> --user <userId>");
    eprintln!("Example: {} --user 42 read user-{{}} note1", program);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_name_with_empty_argv() {
        assert_eq!(program_name(&[]), "data-storage");
        assert_eq!(program_name(&["/usr/bin/ds".to_string()]), "/usr/bin/ds");
    }

    #[test]
    fn test_flag_value_missing_is_error() {
        let args = vec!["ds".to_string(), "--url".to_string()];
        assert!(flag_value(&args, 1).is_err());
    }
}
