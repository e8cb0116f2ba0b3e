//! Write predicted moods back into file metadata

use anyhow::{Context, Result};
use lofty::config::WriteOptions;
use lofty::prelude::*;
use lofty::probe::Probe;
use lofty::tag::Tag;
use std::path::Path;

/// Store `mood` in the file's primary tag under the MOOD item
///
/// Only the metadata is rewritten; audio data is left as is.
pub fn write_mood(audio_path: &Path, mood: &str) -> Result<()> {
    let mut tagged_file = Probe::open(audio_path)
        .with_context(|| format!("Failed to open {:?} for tagging", audio_path))?
        .read()
        .with_context(|| format!("Failed to read tags from {:?}", audio_path))?;

    let tag_type = tagged_file.primary_tag_type();

    if tagged_file.tag(tag_type).is_none() {
        tagged_file.insert_tag(Tag::new(tag_type));
    }
    let tag = tagged_file
        .tag_mut(tag_type)
        .with_context(|| format!("No writable {:?} tag in {:?}", tag_type, audio_path))?;

    if !tag.insert_text(ItemKey::Mood, mood.to_string()) {
        anyhow::bail!("{:?} tags cannot hold a mood", tag_type);
    }

    tagged_file
        .save_to_path(audio_path, WriteOptions::default())
        .with_context(|| format!("Failed to save tags to {:?}", audio_path))?;

    log::info!("Cached mood '{}' to metadata for {:?}", mood, audio_path);
    Ok(())
}

/// Read back a mood written by [`write_mood`]
pub fn read_mood(audio_path: &Path) -> Result<Option<String>> {
    let tagged_file = Probe::open(audio_path)
        .with_context(|| format!("Failed to open {:?}", audio_path))?
        .read()
        .with_context(|| format!("Failed to read tags from {:?}", audio_path))?;

    Ok(tagged_file
        .primary_tag()
        .and_then(|tag| tag.get_string(&ItemKey::Mood))
        .map(str::to_string))
}
