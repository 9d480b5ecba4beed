/*! Methods and types to support querying the businesses table of the database. */

use crate::{
    business::{BusinessRecord, ZoneType},
    geo::GeoPoint,
    SiteResult,
};
use rusqlite::ToSql;

impl super::BusinessDatabase {
    pub fn add_business_handle(&self) -> SiteResult<AddBusinessTransaction> {
        let stmt = self.db.prepare(include_str!("add_business.sql"))?;

        self.db.execute("BEGIN", [])?;
        Ok(AddBusinessTransaction(stmt, &self.db))
    }

    /**
     * Load every business in the database, ordered by id.
     *
     * Rows with coordinates out of range are logged and skipped. Zone names other than
     * "Commercial" and "Residential" are kept as `ZoneType::Other`.
     */
    pub fn all_businesses(&self) -> SiteResult<Vec<BusinessRecord>> {
        let mut stmt = self.db.prepare(include_str!("all_businesses.sql"))?;

        let rows = stmt.query_map([], |row| {
            let id: i64 = row.get(0)?;
            let name: String = row.get(1)?;
            let category: String = row.get(2)?;
            let street: String = row.get(3)?;
            let zone: String = row.get(4)?;
            let lat: f64 = row.get(5)?;
            let lon: f64 = row.get(6)?;

            Ok((id, name, category, street, zone, lat, lon))
        })?;

        let mut businesses = vec![];
        for row in rows {
            let (id, name, category, street, zone, lat, lon) = row?;

            let location = match GeoPoint::new(lat, lon) {
                Ok(location) => location,
                Err(err) => {
                    log::warn!("skipping business {}: {}", id, err);
                    continue;
                }
            };

            businesses.push(BusinessRecord {
                id,
                name,
                category,
                street,
                zone: ZoneType::from(zone.as_str()),
                location,
            });
        }

        log::debug!("loaded {} businesses", businesses.len());

        Ok(businesses)
    }
}

pub struct AddBusinessTransaction<'a>(rusqlite::Statement<'a>, &'a rusqlite::Connection);

impl<'a> AddBusinessTransaction<'a> {
    pub fn add_business(&mut self, business: &BusinessRecord) -> SiteResult<()> {
        let zone = business.zone.name();

        let _ = self.0.execute([
            &business.id as &dyn ToSql,
            &business.name,
            &business.category,
            &business.street,
            &zone,
            &business.location.lat,
            &business.location.lon,
        ])?;

        Ok(())
    }
}

impl<'a> Drop for AddBusinessTransaction<'a> {
    fn drop(&mut self) {
        if let Err(err) = self.1.execute("COMMIT", []) {
            log::error!("failed to commit businesses: {}", err);
        }
    }
}
