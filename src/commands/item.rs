//! One-shot item commands.

use clap::Subcommand;

use itemsync::{
    validate, HttpRemote, Item, ItemActions, LocalListStore, ListenerEvent, Notice, NoticeSink,
    RemoteStore, SyncListener,
};

use super::render::{print_table, OutputFormat, ToastPrinter};

#[derive(Subcommand)]
pub enum ItemSubcommand {
    /// Add an item (overwrites any item with the same ID)
    Add {
        /// Numeric item ID
        id: String,

        /// Display name
        name: String,
    },

    /// Replace an item's ID and name
    Update {
        /// Current item ID
        id: String,

        /// New numeric ID (may equal the current one)
        new_id: String,

        /// New display name
        new_name: String,
    },

    /// Delete an item
    Delete {
        /// Item ID
        id: String,
    },

    /// List all items
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl ItemSubcommand {
    pub async fn run(&self, remote: &HttpRemote) -> Result<(), Box<dyn std::error::Error>> {
        let mut toasts = ToastPrinter;

        match self {
            ItemSubcommand::Add { id, name } => {
                ItemActions::new(remote, &mut toasts).add(id, name).await?;
                Ok(())
            }

            ItemSubcommand::Update {
                id,
                new_id,
                new_name,
            } => update_item(remote, &mut toasts, id, new_id, new_name).await,

            ItemSubcommand::Delete { id } => {
                let item = find_item(remote, &mut toasts, id).await?;
                ItemActions::new(remote, &mut toasts).delete(&item).await?;
                Ok(())
            }

            ItemSubcommand::List { format } => {
                let store = load_list(remote, &mut toasts).await?;
                print_table(store.items(), *format)?;
                Ok(())
            }
        }
    }
}

/// Checks the new values before looking the item up, so bad input is
/// reported as such even when the ID is unknown.
async fn update_item<R: RemoteStore>(
    remote: &R,
    toasts: &mut impl NoticeSink,
    id: &str,
    new_id: &str,
    new_name: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = validate(new_id, new_name) {
        toasts.notify(Notice::from(e.clone()));
        return Err(e.into());
    }

    let original = find_item(remote, toasts, id).await?;
    let outcome = ItemActions::new(remote, toasts)
        .update(&original, new_id, new_name)
        .await?;
    if outcome.is_applied() {
        Ok(())
    } else {
        Err(format!("Update of item {} did not complete", id).into())
    }
}

/// Fills a local list from the first snapshot of a fresh subscription.
async fn load_list<R: RemoteStore>(
    remote: &R,
    toasts: &mut impl NoticeSink,
) -> Result<LocalListStore, Box<dyn std::error::Error>> {
    let mut listener = SyncListener::new();
    let mut store = LocalListStore::new();

    listener.subscribe(remote, toasts).await;
    match listener.process_next(&mut store, toasts).await {
        Some(ListenerEvent::Replaced { .. }) => Ok(store),
        _ => Err("Could not load items".into()),
    }
}

/// Looks an item up by ID in the current list.
async fn find_item<R: RemoteStore>(
    remote: &R,
    toasts: &mut impl NoticeSink,
    id: &str,
) -> Result<Item, Box<dyn std::error::Error>> {
    let store = load_list(remote, toasts).await?;
    let id = id.trim();
    store
        .items()
        .iter()
        .find(|item| item.id == id)
        .cloned()
        .ok_or_else(|| format!("Item not found: {}", id).into())
}
