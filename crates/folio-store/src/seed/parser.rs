//! Seed parser with validation
//!
//! Parses YAML and validates schema version, id uniqueness and page types

#![allow(clippy::result_large_err)]

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use folio_core::model::PageType;

use crate::errors::{io_error, seed_validation, Result};
use crate::seed::format::{SeedBlock, SeedPage, SeedV1};

/// Parse a seed file from a path
pub fn parse_seed_file(path: &Path) -> Result<SeedV1> {
    let content = fs::read_to_string(path).map_err(|e| io_error("seed_parse", e))?;

    parse_seed_str(&content)
}

/// Parse a seed from a string
pub fn parse_seed_str(content: &str) -> Result<SeedV1> {
    let seed: SeedV1 = serde_yaml::from_str(content)
        .map_err(|e| seed_validation(&format!("YAML parse error: {}", e)))?;

    validate_seed(&seed)?;

    Ok(seed)
}

fn validate_seed(seed: &SeedV1) -> Result<()> {
    if seed.schema_version != 1 {
        return Err(seed_validation(&format!(
            "Unsupported schema_version: {}. Expected 1",
            seed.schema_version
        )));
    }

    let mut site_ids = HashSet::new();
    let mut page_ids = HashSet::new();
    let mut block_ids = HashSet::new();
    for site in &seed.sites {
        if !site_ids.insert(site.id.as_str()) {
            return Err(seed_validation(&format!("Duplicate site id {}", site.id)));
        }
        for page in &site.pages {
            validate_page(page, &mut page_ids, &mut block_ids)?;
        }
    }

    Ok(())
}

fn validate_page<'a>(
    page: &'a SeedPage,
    page_ids: &mut HashSet<&'a str>,
    block_ids: &mut HashSet<&'a str>,
) -> Result<()> {
    if !page_ids.insert(page.id.as_str()) {
        return Err(seed_validation(&format!("Duplicate page id {}", page.id)));
    }
    if let Some(page_type) = &page.page_type {
        if PageType::parse(page_type).is_none() {
            return Err(seed_validation(&format!(
                "Unknown page_type '{}' on page {}",
                page_type, page.id
            )));
        }
    }
    for block in &page.blocks {
        validate_block(block, block_ids)?;
    }
    for child in &page.children {
        validate_page(child, page_ids, block_ids)?;
    }
    Ok(())
}

fn validate_block<'a>(block: &'a SeedBlock, block_ids: &mut HashSet<&'a str>) -> Result<()> {
    if !block_ids.insert(block.id.as_str()) {
        return Err(seed_validation(&format!("Duplicate block id {}", block.id)));
    }
    for child in &block.children {
        validate_block(child, block_ids)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_seed() {
        let yaml = r#"
schema_version: 1
sites:
  - id: site-a
    name: Main
    host: example.com
    pages:
      - id: home
        name: Home
        route_name: homepage
        children:
          - id: about
            name: About
            route_name: about
            slug: about
"#;

        let seed = parse_seed_str(yaml).unwrap();
        let (pages, _) = seed.sites[0].flatten();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].parent_id.as_deref(), Some("home"));
    }

    #[test]
    fn test_reject_invalid_schema_version() {
        let yaml = r#"
schema_version: 99
sites: []
"#;

        let err = parse_seed_str(yaml).unwrap_err();
        assert!(err.to_string().contains("schema_version"));
    }

    #[test]
    fn test_reject_duplicate_page_id() {
        let yaml = r#"
schema_version: 1
sites:
  - id: site-a
    name: Main
    host: example.com
    pages:
      - id: home
        name: Home
        route_name: homepage
        children:
          - id: home
            name: Again
            route_name: again
"#;

        let err = parse_seed_str(yaml).unwrap_err();
        assert!(err.to_string().contains("Duplicate page id home"));
    }

    #[test]
    fn test_reject_unknown_page_type() {
        let yaml = r#"
schema_version: 1
sites:
  - id: site-a
    name: Main
    host: example.com
    pages:
      - id: home
        name: Home
        route_name: homepage
        page_type: landing
"#;

        let err = parse_seed_str(yaml).unwrap_err();
        assert!(err.to_string().contains("landing"));
    }

    #[test]
    fn test_nested_blocks_get_parent_ids() {
        let yaml = r#"
schema_version: 1
sites:
  - id: site-a
    name: Main
    host: example.com
    pages:
      - id: home
        name: Home
        route_name: homepage
        blocks:
          - id: main
            type: folio.page.block.container
            settings: { code: content }
            children:
              - id: text-1
                type: folio.block.text
                settings: { content: "Hello" }
"#;

        let seed = parse_seed_str(yaml).unwrap();
        let (_, blocks) = seed.sites[0].flatten();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].parent_id.as_deref(), Some("main"));
        assert_eq!(blocks[1].page_id, "home");
    }
}
