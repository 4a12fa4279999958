//! `Actions` owns the connection pool and runs every blocking diesel call.
//! It is started on a `SyncArbiter`, handlers talk to it through messages.
use actix::prelude::*;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use diesel::result::Error;
use diesel::sqlite::Sqlite;
use log::{debug, info};

use crate::{
    common::ReadingFilter,
    db::{
        model::{DbReading, NewReading, ReadingChanges},
        DbPool,
    },
    error::ServiceError,
    schema::sensors,
};

pub struct Actions {
    pool: DbPool,
}

impl Actor for Actions {
    type Context = SyncContext<Self>;
}

impl Actions {
    pub fn new(pool: DbPool) -> Actions {
        Actions { pool }
    }

    /// Start `threads` storage actors sharing one pool.
    pub fn spawn(pool: DbPool, threads: usize) -> Addr<Actions> {
        SyncArbiter::start(threads, move || Actions::new(pool.clone()))
    }

    fn conn(&self) -> Result<PooledConnection<ConnectionManager<SqliteConnection>>, ServiceError> {
        Ok(self.pool.get()?)
    }
}

/// Persist a new reading
#[derive(Message, Debug)]
#[rtype(result = "Result<DbReading, ServiceError>")]
pub struct CreateReading(pub NewReading);

/// Fetch one reading by id
#[derive(Message, Debug)]
#[rtype(result = "Result<DbReading, ServiceError>")]
pub struct GetReading(pub i32);

/// Every reading matching the filter, in id order
#[derive(Message, Debug)]
#[rtype(result = "Result<Vec<DbReading>, ServiceError>")]
pub struct ListReadings(pub ReadingFilter);

/// Overwrite the fields present in `changes`
#[derive(Message, Debug)]
#[rtype(result = "Result<DbReading, ServiceError>")]
pub struct UpdateReading {
    pub id: i32,
    pub changes: ReadingChanges,
}

impl Handler<CreateReading> for Actions {
    type Result = Result<DbReading, ServiceError>;

    fn handle(&mut self, msg: CreateReading, _: &mut Self::Context) -> Self::Result {
        let mut conn = self.conn()?;
        let reading = insert_reading(&mut conn, &msg.0)?;
        info!("inserted reading {}", reading.id);
        Ok(reading)
    }
}

impl Handler<GetReading> for Actions {
    type Result = Result<DbReading, ServiceError>;

    fn handle(&mut self, msg: GetReading, _: &mut Self::Context) -> Self::Result {
        let mut conn = self.conn()?;
        find_reading(&mut conn, msg.0)?.ok_or_else(ServiceError::not_found)
    }
}

impl Handler<ListReadings> for Actions {
    type Result = Result<Vec<DbReading>, ServiceError>;

    fn handle(&mut self, msg: ListReadings, _: &mut Self::Context) -> Self::Result {
        debug!("listing readings with {:?}", msg.0);
        let mut conn = self.conn()?;
        Ok(list_readings(&mut conn, &msg.0)?)
    }
}

impl Handler<UpdateReading> for Actions {
    type Result = Result<DbReading, ServiceError>;

    fn handle(&mut self, msg: UpdateReading, _: &mut Self::Context) -> Self::Result {
        let mut conn = self.conn()?;
        let reading =
            update_reading(&mut conn, msg.id, &msg.changes)?.ok_or_else(ServiceError::not_found)?;
        info!("updated reading {}", reading.id);
        Ok(reading)
    }
}

/// Insert and read back inside one transaction; a duplicate id rolls back.
pub fn insert_reading(conn: &mut SqliteConnection, new: &NewReading) -> Result<DbReading, Error> {
    conn.transaction::<_, Error, _>(|conn| {
        diesel::insert_into(sensors::table)
            .values(new)
            .execute(conn)?;
        sensors::table.find(new.id).first::<DbReading>(conn)
    })
}

pub fn find_reading(conn: &mut SqliteConnection, id: i32) -> Result<Option<DbReading>, Error> {
    sensors::table
        .find(id)
        .first::<DbReading>(conn)
        .optional()
}

pub fn list_readings(
    conn: &mut SqliteConnection,
    filter: &ReadingFilter,
) -> Result<Vec<DbReading>, Error> {
    let mut query = sensors::table.into_boxed::<Sqlite>();

    if let Some((from, to)) = filter.created_between {
        query = query.filter(sensors::created_at.between(from, to));
    }
    if let Some(ids) = &filter.sensor_ids {
        query = match ids.as_slice() {
            [id] => query.filter(sensors::id.eq(*id)),
            _ => query.filter(sensors::id.eq_any(ids.clone())),
        };
    }
    if let Some(humidity) = filter.humidity {
        query = query.filter(sensors::humidity.eq(humidity));
    }
    if let Some(temperature) = filter.temperature {
        query = query.filter(sensors::temperature.eq(temperature));
    }
    if let Some(windspeed) = filter.windspeed {
        query = query.filter(sensors::windspeed.eq(windspeed));
    }

    query.order(sensors::id.asc()).load::<DbReading>(conn)
}

/// `Ok(None)` when no reading has this id
pub fn update_reading(
    conn: &mut SqliteConnection,
    id: i32,
    changes: &ReadingChanges,
) -> Result<Option<DbReading>, Error> {
    conn.transaction::<_, Error, _>(|conn| {
        // diesel refuses an empty SET clause
        if !changes.is_empty() {
            let updated = diesel::update(sensors::table.find(id))
                .set(changes)
                .execute(conn)?;
            if updated == 0 {
                return Ok(None);
            }
        }
        find_reading(conn, id)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_pool, run_migrations};
    use chrono::NaiveDate;

    fn test_conn() -> PooledConnection<ConnectionManager<SqliteConnection>> {
        let pool = init_pool(":memory:", 1).unwrap();
        run_migrations(&pool).unwrap();
        pool.get().unwrap()
    }

    fn reading(id: i32, temperature: f64, city: &str, day: u32) -> NewReading {
        NewReading {
            id,
            temperature: Some(temperature),
            humidity: Some(50.0),
            windspeed: Some(5.0),
            country_name: Some("USA".to_owned()),
            city_name: Some(city.to_owned()),
            created_at: NaiveDate::from_ymd_opt(2024, 1, day)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn duplicate_insert_leaves_original() {
        let mut conn = test_conn();
        insert_reading(&mut conn, &reading(1, 25.0, "New York", 1)).unwrap();
        let err = insert_reading(&mut conn, &reading(1, 99.0, "Boston", 2)).unwrap_err();
        assert!(err.to_string().contains("UNIQUE"), "{}", err);

        let stored = find_reading(&mut conn, 1).unwrap().unwrap();
        assert_eq!(stored.temperature, Some(25.0));
        assert_eq!(stored.city_name.as_deref(), Some("New York"));
    }

    #[test]
    fn filters_are_anded_and_ordered_by_id() {
        let mut conn = test_conn();
        insert_reading(&mut conn, &reading(3, 25.0, "Austin", 3)).unwrap();
        insert_reading(&mut conn, &reading(1, 25.0, "New York", 1)).unwrap();
        insert_reading(&mut conn, &reading(2, 20.0, "Boston", 2)).unwrap();

        let all = list_readings(&mut conn, &ReadingFilter::default()).unwrap();
        assert_eq!(all.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2, 3]);

        let filter = ReadingFilter {
            temperature: Some(25.0),
            sensor_ids: Some(vec![2, 3]),
            ..ReadingFilter::default()
        };
        let found = list_readings(&mut conn, &filter).unwrap();
        assert_eq!(found.iter().map(|r| r.id).collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn created_range_is_inclusive() {
        let mut conn = test_conn();
        for day in 1..=4 {
            insert_reading(&mut conn, &reading(day as i32, 20.0, "Boston", day)).unwrap();
        }
        let from = reading(0, 0.0, "", 2).created_at;
        let to = reading(0, 0.0, "", 3).created_at;
        let filter = ReadingFilter {
            created_between: Some((from, to)),
            ..ReadingFilter::default()
        };
        let found = list_readings(&mut conn, &filter).unwrap();
        assert_eq!(found.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    fn update_touches_only_given_fields() {
        let mut conn = test_conn();
        insert_reading(&mut conn, &reading(1, 25.0, "New York", 1)).unwrap();
        let changes = ReadingChanges {
            humidity: Some(Some(70.0)),
            country_name: Some(None),
            ..ReadingChanges::default()
        };
        let updated = update_reading(&mut conn, 1, &changes).unwrap().unwrap();
        assert_eq!(updated.humidity, Some(70.0));
        assert_eq!(updated.country_name, None);
        assert_eq!(updated.temperature, Some(25.0));
        assert_eq!(updated.city_name.as_deref(), Some("New York"));
    }

    #[test]
    fn update_of_unknown_id_is_none() {
        let mut conn = test_conn();
        let changes = ReadingChanges {
            humidity: Some(Some(70.0)),
            ..ReadingChanges::default()
        };
        assert_eq!(update_reading(&mut conn, 42, &changes).unwrap(), None);
        assert_eq!(
            update_reading(&mut conn, 42, &ReadingChanges::default()).unwrap(),
            None
        );
        assert!(list_readings(&mut conn, &ReadingFilter::default())
            .unwrap()
            .is_empty());
    }
}
