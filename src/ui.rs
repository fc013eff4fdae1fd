// UI layer: a simple interactive menu using `dialoguer`.
// Each entry collects the arguments of one catalog operation, runs it
// behind a spinner and prints the raw response as pretty JSON.

use crate::magento::{ImageOptions, Magento};
use anyhow::{Context, Result};
use dialoguer::{Confirm, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

const MENU: &[&str] = &[
    "Product info",
    "Update product",
    "List product images",
    "Add image to product",
    "Update product image",
    "Remove product image",
    "Category tree",
    "Create category",
    "Update category",
    "Move category",
    "Assign product to category",
    "Products assigned to category",
    "Exit",
];

/// Main interactive menu; loops until the user chooses "Exit". A failing
/// operation is reported and the menu keeps going.
pub fn main_menu(magento: &Magento) -> Result<()> {
    loop {
        let selection = Select::new().items(MENU).default(0).interact()?;
        match selection {
            0 => {
                let sku = prompt_text("SKU")?;
                run("Fetching product...", || magento.get_product_info(&sku))?;
            }
            1 => {
                let sku = prompt_text("SKU")?;
                let Some(data) = prompt_json("Product data (JSON object)")? else {
                    continue;
                };
                run("Updating product...", || magento.update_product_data(&sku, &data))?;
            }
            2 => {
                let sku = prompt_text("SKU")?;
                run("Listing images...", || magento.get_images_of_product(&sku))?;
            }
            3 => handle_add_image(magento)?,
            4 => {
                let sku = prompt_text("SKU")?;
                let file = prompt_text("Image file (as listed by the server)")?;
                let data = if Confirm::new()
                    .with_prompt("Send image data (label, types, ...)?")
                    .interact()?
                {
                    match prompt_json("Image data (JSON object)")? {
                        Some(data) => Some(data),
                        None => continue,
                    }
                } else {
                    None
                };
                run("Updating image...", || {
                    magento.update_image_of_product(&sku, &file, data.as_ref())
                })?;
            }
            5 => {
                let sku = prompt_text("SKU")?;
                let file = prompt_text("Image file (as listed by the server)")?;
                run("Removing image...", || magento.remove_image_of_product(&sku, &file))?;
            }
            6 => {
                let parent: i64 = Input::new().with_prompt("Parent category id").interact_text()?;
                run("Loading category tree...", || magento.tree_category(parent))?;
            }
            7 => {
                let parent: i64 = Input::new().with_prompt("Parent category id").interact_text()?;
                let Some(data) = prompt_json("Category data (JSON object)")? else {
                    continue;
                };
                run("Creating category...", || magento.create_category(parent, &data))?;
            }
            8 => {
                let id: i64 = Input::new().with_prompt("Category id").interact_text()?;
                let Some(data) = prompt_json("Category data (JSON object)")? else {
                    continue;
                };
                run("Updating category...", || magento.update_category(id, &data))?;
            }
            9 => {
                let id: i64 = Input::new().with_prompt("Category id").interact_text()?;
                let parent: i64 = Input::new().with_prompt("New parent id").interact_text()?;
                run("Moving category...", || magento.move_category(id, parent))?;
            }
            10 => {
                let id: i64 = Input::new().with_prompt("Category id").interact_text()?;
                let sku = prompt_text("SKU")?;
                run("Assigning product...", || magento.assign_product(id, &sku))?;
            }
            11 => {
                let id: i64 = Input::new().with_prompt("Category id").interact_text()?;
                let store: i64 = Input::new()
                    .with_prompt("Store id")
                    .default(0)
                    .interact_text()?;
                run("Loading products...", || magento.assigned_products(id, store))?;
            }
            _ => break,
        }
    }
    Ok(())
}

/// Collect the image path and gallery options, then upload.
fn handle_add_image(magento: &Magento) -> Result<()> {
    let sku = prompt_text("SKU")?;
    let path = PathBuf::from(prompt_text("Image file path")?);
    let exclude = Confirm::new()
        .with_prompt("Exclude from product page?")
        .default(false)
        .interact()?;
    let position: i64 = Input::new()
        .with_prompt("Position")
        .default(0)
        .interact_text()?;
    let types: String = Input::new()
        .with_prompt("Types (comma separated, e.g. image,small_image,thumbnail)")
        .allow_empty(true)
        .interact_text()?;

    let mut options = ImageOptions::default()
        .exclude(exclude)
        .position(position)
        .types(types.split(',').map(str::trim).filter(|t| !t.is_empty()));
    // the server stores everything as jpeg unless told otherwise
    if Confirm::new()
        .with_prompt("Detect mime type from file extension?")
        .default(false)
        .interact()?
    {
        options = options.infer_mime(&path);
    }

    run("Uploading image...", || {
        magento.add_image_to_product(&sku, &path, &options)
    })
}

fn prompt_text(prompt: &str) -> Result<String> {
    let value: String = Input::new().with_prompt(prompt).interact_text()?;
    Ok(value.trim().to_string())
}

/// Reads a JSON document; prints the parse error and returns `None` on bad input.
fn prompt_json(prompt: &str) -> Result<Option<Value>> {
    let raw: String = Input::new().with_prompt(prompt).interact_text()?;
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            println!("Invalid JSON: {}", e);
            Ok(None)
        }
    }
}

/// Runs one remote operation behind a spinner and prints its outcome.
fn run<F>(message: &'static str, op: F) -> Result<()>
where
    F: FnOnce() -> crate::Result<Value>,
{
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    let outcome = op();
    spinner.finish_and_clear();

    match outcome {
        Ok(value) => {
            let pretty = serde_json::to_string_pretty(&value).context("Formatting response")?;
            println!("{}", pretty);
        }
        Err(e) => println!("Request failed: {}", e),
    }
    Ok(())
}
