//! "New CSV file" command of the folder context menu.

use tracing::info;

use crate::codec::empty_csv;
use crate::config::ViewConfig;
use crate::error::HostError;
use crate::host::{FolderEntry, Vault};
use crate::view::EXTENSION;

/// Title of the folder context menu item
pub const MENU_TITLE: &str = "New CSV file";
/// Icon of the folder context menu item
pub const MENU_ICON: &str = "document";

const UNTITLED: &str = "Untitled";

/// Leading integer of `text`, the way a lenient number parse reads it
/// ("12abc" is 12, "abc" is nothing)
fn leading_int(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, text.strip_prefix('+').unwrap_or(text)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

/// Next free "Untitled" name among a folder's children. Only CSV children
/// whose basename contains "Untitled" are considered; a numbered one
/// ("Untitled 3") pushes the index past its number, an unnumbered one makes
/// the index at least 1.
pub fn untitled_name<'a>(children: impl IntoIterator<Item = &'a FolderEntry>) -> String {
    // wide enough that one past any parsed number cannot overflow
    let mut index: i128 = 0;

    for child in children {
        if child.extension != EXTENSION || !child.basename.contains(UNTITLED) {
            continue;
        }
        match child.basename.split(' ').nth(1).and_then(leading_int) {
            Some(n) => {
                let n = i128::from(n);
                if n >= index {
                    index = n + 1;
                }
            }
            None => index = index.max(1),
        }
    }

    if index > 0 {
        format!("{} {}", UNTITLED, index)
    } else {
        UNTITLED.to_string()
    }
}

/// Vault path of `name.csv` inside `folder` (the vault root is "/" or "")
pub fn file_path_in(folder: &str, name: &str) -> String {
    let folder = folder.trim_end_matches('/');
    if folder.is_empty() {
        format!("{}.{}", name, EXTENSION)
    } else {
        format!("{}/{}.{}", folder, name, EXTENSION)
    }
}

/// Create an empty CSV file in `folder` and tell the user about it.
/// The new file is not opened. Returns the created path.
pub fn create_csv_file<V: Vault>(
    vault: &mut V,
    folder: &str,
    children: &[FolderEntry],
    config: &ViewConfig,
) -> Result<String, HostError> {
    let name = untitled_name(children);
    let path = file_path_in(folder, &name);
    let contents = empty_csv(config.new_file_rows, config.new_file_cols);

    vault.create(&path, &contents)?;
    info!(path = %path, "created CSV file");
    vault.notify(&format!(
        "The file \"{}\" has been created in the folder \"{}\".",
        name, folder
    ));
    Ok(path)
}
