use crate::song::{Song, SongId};

/// Ordered song list. Order is meaningful: it defines next/previous in
/// sequential mode. The cursor itself lives in the controller.
#[derive(Debug, Default)]
pub struct Playlist {
    songs: Vec<Song>,
}

impl Playlist {
    pub fn new() -> Self {
        Self { songs: Vec::new() }
    }

    pub fn replace(&mut self, songs: Vec<Song>) {
        self.songs = songs;
    }

    pub fn push(&mut self, song: Song) {
        self.songs.push(song);
    }

    pub fn remove(&mut self, index: usize) -> Option<Song> {
        if index < self.songs.len() {
            Some(self.songs.remove(index))
        } else {
            None
        }
    }

    pub fn get(&self, index: usize) -> Option<&Song> {
        self.songs.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Song> {
        self.songs.get_mut(index)
    }

    pub fn position_of(&self, id: SongId) -> Option<usize> {
        self.songs.iter().position(|s| s.id == id)
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Song> {
        self.songs.iter()
    }
}
