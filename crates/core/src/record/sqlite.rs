use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::Mutex;

use super::{
    CatalogRecord, Disposition, MediumType, NewRecord, RecordError, RecordFilter, RecordPatch,
    RecordStore,
};
use crate::normalize::normalize_certification;
use crate::torrents::TorrentDescriptor;

/// SQLite-backed record store.
pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
}

impl SqliteRecordStore {
    pub fn new(path: &Path) -> Result<Self, RecordError> {
        let conn = Connection::open(path).map_err(db_err)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// In-memory store for tests.
    pub fn in_memory() -> Result<Self, RecordError> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), RecordError> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                tmdb_id INTEGER,
                imdb_id TEXT,
                title TEXT NOT NULL,
                overview TEXT NOT NULL DEFAULT '',
                release_year INTEGER,
                genres TEXT NOT NULL DEFAULT '',
                runtime_minutes INTEGER,
                rating REAL,
                certification TEXT NOT NULL DEFAULT '',
                original_language TEXT NOT NULL DEFAULT '',
                budget INTEGER,
                revenue INTEGER,
                production_companies TEXT NOT NULL DEFAULT '',
                tagline TEXT NOT NULL DEFAULT '',
                director TEXT NOT NULL DEFAULT '',
                disposition TEXT NOT NULL,
                medium TEXT NOT NULL,
                special_edition INTEGER NOT NULL DEFAULT 0,
                box_set INTEGER NOT NULL DEFAULT 0,
                box_set_name TEXT NOT NULL DEFAULT '',
                unopened INTEGER NOT NULL DEFAULT 0,
                unwatched INTEGER NOT NULL DEFAULT 0,
                storage_label TEXT NOT NULL DEFAULT '',
                slot TEXT,
                copy_number INTEGER NOT NULL DEFAULT 1,
                copy_notes TEXT NOT NULL DEFAULT '',
                poster_ref TEXT,
                torrents TEXT NOT NULL DEFAULT '[]',
                torrents_refreshed_at INTEGER,
                has_torrents INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_records_tmdb_id ON records(tmdb_id);
            CREATE INDEX IF NOT EXISTS idx_records_title ON records(title);
            CREATE INDEX IF NOT EXISTS idx_records_disposition ON records(disposition);
            "#,
        )
        .map_err(db_err)
    }
}

fn db_err(e: rusqlite::Error) -> RecordError {
    RecordError::Database(e.to_string())
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<CatalogRecord> {
    let disposition: String = row.get("disposition")?;
    let medium: String = row.get("medium")?;
    let torrents_json: String = row.get("torrents")?;
    let created_at: i64 = row.get("created_at")?;
    let updated_at: i64 = row.get("updated_at")?;
    let refreshed_at: Option<i64> = row.get("torrents_refreshed_at")?;

    Ok(CatalogRecord {
        id: row.get("id")?,
        tmdb_id: row.get("tmdb_id")?,
        imdb_id: row.get("imdb_id")?,
        title: row.get("title")?,
        overview: row.get("overview")?,
        release_year: row.get("release_year")?,
        genres: row.get("genres")?,
        runtime_minutes: row.get("runtime_minutes")?,
        rating: row.get("rating")?,
        certification: row.get("certification")?,
        original_language: row.get("original_language")?,
        budget: row.get("budget")?,
        revenue: row.get("revenue")?,
        production_companies: row.get("production_companies")?,
        tagline: row.get("tagline")?,
        director: row.get("director")?,
        disposition: Disposition::parse(&disposition).unwrap_or(Disposition::Kept),
        medium: MediumType::parse(&medium).unwrap_or(MediumType::Physical),
        special_edition: row.get("special_edition")?,
        box_set: row.get("box_set")?,
        box_set_name: row.get("box_set_name")?,
        unopened: row.get("unopened")?,
        unwatched: row.get("unwatched")?,
        storage_label: row.get("storage_label")?,
        slot: row.get("slot")?,
        copy_number: row.get("copy_number")?,
        copy_notes: row.get("copy_notes")?,
        poster_ref: row.get("poster_ref")?,
        torrents: serde_json::from_str(&torrents_json).unwrap_or_default(),
        torrents_refreshed_at: refreshed_at.and_then(|secs| DateTime::from_timestamp(secs, 0)),
        has_torrents: row.get("has_torrents")?,
        created_at: DateTime::from_timestamp(created_at, 0).unwrap_or_default(),
        updated_at: DateTime::from_timestamp(updated_at, 0).unwrap_or_default(),
    })
}

fn apply_patch(record: &mut CatalogRecord, patch: &RecordPatch) {
    if let Some(v) = patch.tmdb_id {
        record.tmdb_id = Some(v);
    }
    if let Some(v) = &patch.imdb_id {
        record.imdb_id = Some(v.clone());
    }
    if let Some(v) = &patch.title {
        record.title = v.clone();
    }
    if let Some(v) = &patch.overview {
        record.overview = v.clone();
    }
    if let Some(v) = patch.release_year {
        record.release_year = Some(v);
    }
    if let Some(v) = &patch.genres {
        record.genres = v.clone();
    }
    if let Some(v) = patch.runtime_minutes {
        record.runtime_minutes = Some(v);
    }
    if let Some(v) = patch.rating {
        record.rating = Some(v);
    }
    if let Some(v) = &patch.certification {
        record.certification = v.clone();
    }
    if let Some(v) = &patch.original_language {
        record.original_language = v.clone();
    }
    if let Some(v) = patch.budget {
        record.budget = Some(v);
    }
    if let Some(v) = patch.revenue {
        record.revenue = Some(v);
    }
    if let Some(v) = &patch.production_companies {
        record.production_companies = v.clone();
    }
    if let Some(v) = &patch.tagline {
        record.tagline = v.clone();
    }
    if let Some(v) = &patch.director {
        record.director = v.clone();
    }
    if let Some(v) = patch.disposition {
        record.disposition = v;
    }
    if let Some(v) = patch.medium {
        record.medium = v;
    }
    if let Some(v) = patch.special_edition {
        record.special_edition = v;
    }
    if let Some(v) = patch.box_set {
        record.box_set = v;
    }
    if let Some(v) = &patch.box_set_name {
        record.box_set_name = v.clone();
    }
    if let Some(v) = patch.unopened {
        record.unopened = v;
    }
    if let Some(v) = patch.unwatched {
        record.unwatched = v;
    }
    if let Some(v) = &patch.storage_label {
        record.storage_label = v.clone();
    }
    if let Some(v) = &patch.slot {
        record.slot = Some(v.clone());
    }
    if let Some(v) = patch.copy_number {
        record.copy_number = v;
    }
    if let Some(v) = &patch.copy_notes {
        record.copy_notes = v.clone();
    }
    if let Some(v) = &patch.poster_ref {
        record.poster_ref = Some(v.clone());
    }
}

impl RecordStore for SqliteRecordStore {
    fn create(&self, record: NewRecord) -> Result<CatalogRecord, RecordError> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().timestamp();
        conn.execute(
            r#"
            INSERT INTO records (
                tmdb_id, imdb_id, title, overview, release_year, genres,
                runtime_minutes, rating, certification, original_language,
                budget, revenue, production_companies, tagline, director,
                disposition, medium, special_edition, box_set, box_set_name,
                unopened, unwatched, storage_label, slot, copy_number,
                copy_notes, poster_ref, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26,
                ?27, ?28, ?29
            )
            "#,
            params![
                record.tmdb_id,
                record.imdb_id,
                record.title,
                record.overview,
                record.release_year,
                record.genres,
                record.runtime_minutes,
                record.rating,
                normalize_certification(&record.certification),
                record.original_language,
                record.budget,
                record.revenue,
                record.production_companies,
                record.tagline,
                record.director,
                record.disposition.as_str(),
                record.medium.as_str(),
                record.special_edition,
                record.box_set,
                record.box_set_name,
                record.unopened,
                record.unwatched,
                record.storage_label,
                record.slot,
                record.copy_number,
                record.copy_notes,
                record.poster_ref,
                now,
                now,
            ],
        )
        .map_err(db_err)?;

        let id = conn.last_insert_rowid();
        conn.query_row("SELECT * FROM records WHERE id = ?1", params![id], |row| {
            row_to_record(row)
        })
        .map_err(db_err)
    }

    fn get(&self, id: i64) -> Result<CatalogRecord, RecordError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT * FROM records WHERE id = ?1", params![id], |row| {
            row_to_record(row)
        })
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => RecordError::NotFound(id),
            other => db_err(other),
        })
    }

    fn update(&self, id: i64, patch: &RecordPatch) -> Result<CatalogRecord, RecordError> {
        let mut record = self.get(id)?;
        apply_patch(&mut record, patch);
        record.certification = normalize_certification(&record.certification);
        record.updated_at = Utc::now();

        let conn = self.conn.lock().unwrap();
        let changed = conn
            .execute(
                r#"
                UPDATE records SET
                    tmdb_id = ?1, imdb_id = ?2, title = ?3, overview = ?4,
                    release_year = ?5, genres = ?6, runtime_minutes = ?7,
                    rating = ?8, certification = ?9, original_language = ?10,
                    budget = ?11, revenue = ?12, production_companies = ?13,
                    tagline = ?14, director = ?15, disposition = ?16,
                    medium = ?17, special_edition = ?18, box_set = ?19,
                    box_set_name = ?20, unopened = ?21, unwatched = ?22,
                    storage_label = ?23, slot = ?24, copy_number = ?25,
                    copy_notes = ?26, poster_ref = ?27, updated_at = ?28
                WHERE id = ?29
                "#,
                params![
                    record.tmdb_id,
                    record.imdb_id,
                    record.title,
                    record.overview,
                    record.release_year,
                    record.genres,
                    record.runtime_minutes,
                    record.rating,
                    record.certification,
                    record.original_language,
                    record.budget,
                    record.revenue,
                    record.production_companies,
                    record.tagline,
                    record.director,
                    record.disposition.as_str(),
                    record.medium.as_str(),
                    record.special_edition,
                    record.box_set,
                    record.box_set_name,
                    record.unopened,
                    record.unwatched,
                    record.storage_label,
                    record.slot,
                    record.copy_number,
                    record.copy_notes,
                    record.poster_ref,
                    record.updated_at.timestamp(),
                    id,
                ],
            )
            .map_err(db_err)?;

        if changed == 0 {
            return Err(RecordError::NotFound(id));
        }
        Ok(record)
    }

    fn delete(&self, id: i64) -> Result<(), RecordError> {
        let conn = self.conn.lock().unwrap();
        let changed = conn
            .execute("DELETE FROM records WHERE id = ?1", params![id])
            .map_err(db_err)?;
        if changed == 0 {
            return Err(RecordError::NotFound(id));
        }
        Ok(())
    }

    fn list(&self, filter: &RecordFilter) -> Result<Vec<CatalogRecord>, RecordError> {
        let mut sql = String::from("SELECT * FROM records WHERE 1=1");
        let mut args: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            sql.push_str(
                " AND (title LIKE ?1 COLLATE NOCASE OR overview LIKE ?1 COLLATE NOCASE \
                 OR genres LIKE ?1 COLLATE NOCASE OR box_set_name LIKE ?1 COLLATE NOCASE)",
            );
            args.push(Box::new(format!("%{}%", search.trim())));
        }
        if let Some(disposition) = filter.disposition {
            sql.push_str(&format!(" AND disposition = ?{}", args.len() + 1));
            args.push(Box::new(disposition.as_str().to_string()));
        }
        if let Some(medium) = filter.medium {
            sql.push_str(&format!(" AND medium = ?{}", args.len() + 1));
            args.push(Box::new(medium.as_str().to_string()));
        }
        if let Some(box_set) = filter.box_set {
            sql.push_str(&format!(" AND box_set = ?{}", args.len() + 1));
            args.push(Box::new(box_set));
        }
        if let Some(unopened) = filter.unopened {
            sql.push_str(&format!(" AND unopened = ?{}", args.len() + 1));
            args.push(Box::new(unopened));
        }
        if let Some(unwatched) = filter.unwatched {
            sql.push_str(&format!(" AND unwatched = ?{}", args.len() + 1));
            args.push(Box::new(unwatched));
        }
        if let Some(has_torrents) = filter.has_torrents {
            sql.push_str(&format!(" AND has_torrents = ?{}", args.len() + 1));
            args.push(Box::new(has_torrents));
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC");

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&sql).map_err(db_err)?;
        let arg_refs: Vec<&dyn rusqlite::ToSql> = args.iter().map(|a| a.as_ref()).collect();
        let rows = stmt
            .query_map(arg_refs.as_slice(), row_to_record)
            .map_err(db_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
    }

    fn find_by_tmdb_id(&self, tmdb_id: i64) -> Result<Vec<CatalogRecord>, RecordError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT * FROM records WHERE tmdb_id = ?1 ORDER BY copy_number ASC, id ASC",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![tmdb_id], row_to_record)
            .map_err(db_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
    }

    fn find_by_title_year(
        &self,
        title: &str,
        year: Option<i32>,
    ) -> Result<Vec<CatalogRecord>, RecordError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT * FROM records WHERE title = ?1 COLLATE NOCASE \
                 AND release_year IS ?2 ORDER BY copy_number ASC, id ASC",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![title, year], row_to_record)
            .map_err(db_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
    }

    fn in_transit_slots(&self) -> Result<Vec<(i64, String)>, RecordError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT id, slot FROM records \
                 WHERE disposition = 'in_transit' AND slot IS NOT NULL",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .map_err(db_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
    }

    fn set_torrent_cache(
        &self,
        id: i64,
        torrents: &[TorrentDescriptor],
        refreshed_at: DateTime<Utc>,
    ) -> Result<(), RecordError> {
        let json = serde_json::to_string(torrents)
            .map_err(|e| RecordError::Database(e.to_string()))?;
        let conn = self.conn.lock().unwrap();
        let changed = conn
            .execute(
                "UPDATE records SET torrents = ?1, torrents_refreshed_at = ?2, \
                 has_torrents = ?3 WHERE id = ?4",
                params![json, refreshed_at.timestamp(), !torrents.is_empty(), id],
            )
            .map_err(db_err)?;
        if changed == 0 {
            return Err(RecordError::NotFound(id));
        }
        Ok(())
    }

    fn ids_with_tmdb_id(&self) -> Result<Vec<i64>, RecordError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT id FROM records WHERE tmdb_id IS NOT NULL ORDER BY id ASC")
            .map_err(db_err)?;
        let rows = stmt.query_map([], |row| row.get(0)).map_err(db_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
    }

    fn count(&self) -> Result<u64, RecordError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))
            .map_err(db_err)
    }
}
