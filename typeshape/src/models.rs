//! Demonstration models described by the inspector.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use typeshape::{Introspect, MetadataCache, TypeMember, introspect_members};

pub trait Playable {
    fn runtime_minutes(&self) -> u32;
}

#[derive(Introspect, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
#[shape(default)]
pub enum Quality {
    #[default]
    Sd = 0,
    Hd = 1,
    #[tag(label = "4K")]
    Uhd = 2,
}

#[derive(Introspect, Debug, Clone, Default)]
#[shape(class, default)]
pub struct Media {
    #[shape(readonly)]
    pub id: Uuid,
    pub added_at: Option<DateTime<Utc>>,
}

#[derive(Introspect, Debug, Clone, Default)]
#[shape(default)]
pub struct Episode {
    pub season: u32,
    pub number: u32,
    pub title: String,
    pub runtime: Option<u32>,
}

#[derive(Introspect, Debug, Clone, Default)]
#[shape(class, default, impl_members, base = Media, implements(Playable))]
#[shape(event(name = "watched", handler = "fn(Uuid)"))]
#[tag(graphql_name = "Show")]
pub struct Show {
    #[shape(readonly)]
    pub id: Uuid,
    pub title: String,
    pub year: Option<i32>,
    pub quality: Quality,
    #[tag(paginate)]
    pub episodes: Vec<Episode>,
    pub ratings: HashMap<String, f64>,
    pub(crate) monitored: bool,
    notes: String,
    #[shape(skip)]
    pub poster: Option<Arc<[u8]>>,
}

#[introspect_members]
impl Show {
    pub const MAX_SEASONS: u32 = 40;

    pub fn new(title: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            monitored: true,
            ..Default::default()
        }
    }

    pub fn with_year(title: String, year: i32) -> Self {
        Self {
            year: Some(year),
            ..Self::new(title)
        }
    }

    #[shape(get)]
    pub fn display_title(&self) -> String {
        match self.year {
            Some(year) => format!("{} ({})", self.title, year),
            None => self.title.clone(),
        }
    }

    #[shape(get)]
    pub fn notes(&self) -> String {
        self.notes.clone()
    }

    #[shape(set)]
    pub fn set_notes(&mut self, notes: String) {
        self.notes = notes;
    }

    /// Weighted average of every rating recorded so far
    pub fn rate(&mut self, source: String, score: f64, #[shape(default = 1u32)] weight: u32) -> f64 {
        for _ in 0..weight {
            self.ratings.insert(format!("{}#{}", source, self.ratings.len()), score);
        }
        let total: f64 = self.ratings.values().sum();
        total / self.ratings.len() as f64
    }

    pub fn add_episode(&mut self, episode: Episode) -> usize {
        self.episodes.push(episode);
        self.episodes.len()
    }

    pub fn find_episode(&self, title: &str) -> Option<Episode> {
        self.episodes.iter().find(|e| e.title == title).cloned()
    }

    pub fn slug(title: String) -> String {
        title
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-")
    }

    pub fn into_episodes(self) -> Vec<Episode> {
        self.episodes
    }
}

impl Playable for Show {
    fn runtime_minutes(&self) -> u32 {
        self.episodes.iter().filter_map(|e| e.runtime).sum()
    }
}

/// Folder tree: each folder lists its children
#[derive(Introspect, Debug, Clone, Default)]
#[shape(class, default)]
pub struct Folder {
    pub name: String,
    pub children: Vec<Folder>,
    pub parent: Option<Box<Folder>>,
}

#[derive(Introspect, Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub cursor: Option<String>,
}

#[derive(Introspect, Debug, Clone, Default)]
#[shape(enumerable, default)]
pub struct Playlist {
    pub name: String,
    pub entries: Vec<Uuid>,
}

/// Describe every demonstration model
pub fn describe_all(cache: &MetadataCache) -> typeshape::Result<Vec<Arc<TypeMember>>> {
    Ok(vec![
        cache.get::<Show>()?,
        cache.get::<Folder>()?,
        cache.get::<Page<Show>>()?,
        cache.get::<Playlist>()?,
        cache.get::<HashMap<Uuid, Page<Episode>>>()?,
    ])
}
