use assetstore::config::{self, StoreConfig};
use assetstore::uploads::{self, Upload, UploadPolicy};
use assetstore::{AssetStore, logging, output};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "assetstore")]
#[command(about = "Hierarchical file-backed image asset store")]
#[command(long_about = "\
Hierarchical file-backed image asset store

Folders are directories under the storage root. Every image keeps its
uploaded original, a WebP primary rendition, and one cover-fit derivative
per size configured on its folder:

  storage/
  └── travel/
      ├── index.json                 # order, sizes
      ├── originals/dawn-1a2b3c4d.jpg
      ├── webp/dawn-1a2b3c4d.webp    # primary rendition
      ├── 400x300/dawn-1a2b3c4d.webp # derivative
      └── japan/                     # subfolder

Folder paths are relative to the storage root; use \"\" for the root.
The names originals, webp and WIDTHxHEIGHT are reserved.

Run 'assetstore gen-config' to generate a documented config file.")]
#[command(version)]
struct Cli {
    /// Config file (default: ./assetstore.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Storage root, overriding config and STORAGE_ROOT
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the storage root if missing
    Init,
    /// Show the folder tree
    Tree {
        #[arg(default_value = "")]
        folder: String,
    },
    /// List a folder's images, sizes and subfolders
    Ls {
        #[arg(default_value = "")]
        folder: String,
    },
    /// Upload image files into a folder
    Upload {
        folder: String,
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Delete existing images with the same name before storing
        #[arg(long)]
        replace: bool,
    },
    /// Report which file names would collide with stored images
    Duplicates {
        folder: String,
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Rename an image (its hash is kept)
    Rename {
        folder: String,
        filename: String,
        new_name: String,
    },
    /// Move images to another folder
    Move {
        from: String,
        to: String,
        #[arg(required = true)]
        filenames: Vec<String>,
    },
    /// Delete images
    Delete {
        folder: String,
        #[arg(required = true)]
        filenames: Vec<String>,
    },
    /// Set the display order (unlisted images keep their place at the end)
    Reorder {
        folder: String,
        filenames: Vec<String>,
    },
    /// Configure a derivative size and generate it for every image
    AddSize { folder: String, size: String },
    /// Remove a derivative size and its files
    RemoveSize { folder: String, size: String },
    /// Create a folder
    Mkdir {
        parent: String,
        name: String,
    },
    /// Delete a folder and everything below it
    Rmdir { folder: String },
    /// Rename a folder
    RenameFolder { folder: String, new_name: String },
    /// Move a folder under another parent
    MoveFolder { folder: String, new_parent: String },
    /// Print a stock config file with all options documented
    GenConfig,
}

/// Folder arguments are root-relative; tolerate a leading or trailing slash.
fn folder_arg(raw: &str) -> &str {
    raw.trim_matches('/')
}

fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce()) -> serde_json::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        text();
    }
    Ok(())
}

fn load_uploads(files: &[PathBuf]) -> std::io::Result<Vec<Upload>> {
    files
        .iter()
        .map(|path| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            Ok(Upload::new(name, std::fs::read(path)?))
        })
        .collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let mut store_config: StoreConfig = config::load_config(cli.config.as_deref())?;
    if let Some(root) = cli.root {
        store_config.storage_root = root;
    }
    logging::init(&store_config.logging);

    let store = AssetStore::from_config(&store_config)?;
    let json = cli.json;

    match cli.command {
        Command::GenConfig => {}
        Command::Init => {
            store.ensure_storage_root()?;
            let root = store.root().display().to_string();
            emit(json, &json!({ "root": root }), || println!("Storage root: {}", root))?;
        }
        Command::Tree { folder } => {
            let tree = store.get_folder_tree(folder_arg(&folder))?;
            emit(json, &tree, || output::print_tree(&tree))?;
        }
        Command::Ls { folder } => {
            let content = store.get_folder_content(folder_arg(&folder))?;
            emit(json, &content, || output::print_folder_content(&content))?;
        }
        Command::Upload {
            folder,
            files,
            replace,
        } => {
            let policy = if replace {
                UploadPolicy::Replace
            } else {
                UploadPolicy::Keep
            };
            let batch = load_uploads(&files)?;
            let report = uploads::upload_files(&store, folder_arg(&folder), &batch, policy);
            let stored: Vec<&str> = report.stored().collect();
            emit(json, &stored, || output::print_upload_report(&report))?;
            if report.has_failures() {
                std::process::exit(1);
            }
        }
        Command::Duplicates { folder, names } => {
            let dups = store.find_duplicates(folder_arg(&folder), &names)?;
            emit(json, &dups, || {
                for name in &dups {
                    println!("{}", name);
                }
            })?;
        }
        Command::Rename {
            folder,
            filename,
            new_name,
        } => {
            let renamed = store.rename_image(folder_arg(&folder), &filename, &new_name)?;
            emit(json, &renamed, || println!("{} → {}", filename, renamed))?;
        }
        Command::Move {
            from,
            to,
            filenames,
        } => {
            let to = folder_arg(&to);
            store.bulk_move_images(folder_arg(&from), &filenames, to)?;
            emit(json, &json!({ "moved": filenames, "to": to }), || {
                println!("Moved {} image(s) to {}", filenames.len(), to)
            })?;
        }
        Command::Delete { folder, filenames } => {
            store.bulk_delete_images(folder_arg(&folder), &filenames)?;
            emit(json, &json!({ "deleted": filenames }), || {
                println!("Deleted {} image(s)", filenames.len())
            })?;
        }
        Command::Reorder { folder, filenames } => {
            let order = store.reorder_images(folder_arg(&folder), &filenames)?;
            emit(json, &order, || {
                for name in &order {
                    println!("{}", name);
                }
            })?;
        }
        Command::AddSize { folder, size } => {
            let generated = store.add_size_to_folder(folder_arg(&folder), &size)?;
            emit(json, &json!({ "size": size, "generated": generated }), || {
                println!("Added {} ({} derivative(s) generated)", size, generated)
            })?;
        }
        Command::RemoveSize { folder, size } => {
            store.remove_size_from_folder(folder_arg(&folder), &size)?;
            emit(json, &json!({ "removed": size }), || println!("Removed {}", size))?;
        }
        Command::Mkdir { parent, name } => {
            let path = store.create_folder(folder_arg(&parent), &name)?;
            emit(json, &json!({ "path": path }), || println!("Created {}", path))?;
        }
        Command::Rmdir { folder } => {
            let folder = folder_arg(&folder);
            store.delete_folder(folder)?;
            emit(json, &json!({ "deleted": folder }), || println!("Deleted {}", folder))?;
        }
        Command::RenameFolder { folder, new_name } => {
            let path = store.rename_folder(folder_arg(&folder), &new_name)?;
            emit(json, &json!({ "path": path }), || println!("Renamed to {}", path))?;
        }
        Command::MoveFolder { folder, new_parent } => {
            let path = store.move_folder(folder_arg(&folder), folder_arg(&new_parent))?;
            emit(json, &json!({ "path": path }), || println!("Moved to {}", path))?;
        }
    }

    Ok(())
}
