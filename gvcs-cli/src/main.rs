//! Gvcs command-line interface
//!
//! Thin glue over the core storage engine: every subcommand is a direct
//! pass-through to one repository or object-store operation.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use gvcs_core::{Object, ObjectKind, Repository};
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "gvcs")]
#[command(author = "Gvcs Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Content-addressed object storage for version control")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Initialize a new repository
    Init {
        /// Where to create the repository
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Compute the digest of a file, optionally storing it
    HashObject {
        /// Object type to hash the payload as
        #[arg(short = 't', long = "type", value_enum, default_value = "blob")]
        kind: CliKind,
        /// Actually write the object into the database
        #[arg(short, long)]
        write: bool,
        /// Read the object payload from this file
        path: PathBuf,
    },

    /// Print the payload of a stored object
    CatFile {
        /// Expected object type; tag and commit indirection is followed
        #[arg(value_enum)]
        kind: CliKind,
        /// Digest, digest prefix, or reference name
        object: String,
    },

    /// Resolve a name to a full digest
    RevParse {
        /// Digest prefix or reference name
        name: String,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum CliKind {
    Blob,
    Tree,
    Commit,
    Tag,
}

impl From<CliKind> for ObjectKind {
    fn from(kind: CliKind) -> Self {
        match kind {
            CliKind::Blob => ObjectKind::Blob,
            CliKind::Tree => ObjectKind::Tree,
            CliKind::Commit => ObjectKind::Commit,
            CliKind::Tag => ObjectKind::Tag,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Init { path } => {
            let repo = Repository::create(&path)?;
            println!(
                "Initialized empty repository in {}",
                repo.gitdir().display()
            );
        }

        Commands::HashObject { kind, write, path } => {
            let data = std::fs::read(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let object = Object::from_bytes(kind.into(), &data)?;
            let id = if write {
                let repo = Repository::discover(".")?;
                repo.objects().write(&object)?
            } else {
                object.id()
            };
            println!("{id}");
        }

        Commands::CatFile { kind, object } => {
            let repo = Repository::discover(".")?;
            let store = repo.objects();
            let id = store.resolve(&object)?;
            let object = peel(&store, id, kind.into())?;
            std::io::stdout().write_all(&object.to_bytes())?;
        }

        Commands::RevParse { name } => {
            let repo = Repository::discover(".")?;
            println!("{}", repo.objects().resolve(&name)?);
        }
    }

    Ok(())
}

/// Follow tag (and commit-to-tree) indirection until an object of the
/// requested kind is reached.
fn peel(store: &gvcs_core::ObjectStore<'_>, id: gvcs_core::ObjectId, want: ObjectKind) -> Result<Object> {
    let mut current = id;
    loop {
        let object = store.read(&current)?;
        current = match (&object, want) {
            (object, want) if object.kind() == want => return Ok(object.clone()),
            (Object::Tag(tag), _) => tag.target,
            (Object::Commit(commit), ObjectKind::Tree) => commit.tree,
            (object, want) => bail!(
                "object {current} is a {}, not a {want}",
                object.kind()
            ),
        };
    }
}
