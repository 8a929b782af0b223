use crate::errors::AppError;
use crate::models::room::Room;
use crate::store::{to_document, Query};

use super::{require, Repository, ROOMS};

impl Repository {
    pub async fn add_room(&self, room: &Room) -> Result<(), AppError> {
        require("room_no", &room.room_no)?;
        if room.capacity == 0 {
            return Err(AppError::validation("capacity must be at least 1"));
        }
        if self.store.get(ROOMS, &room.room_no).await?.is_some() {
            return Err(AppError::validation(format!(
                "room {} already exists",
                room.room_no
            )));
        }
        self.store
            .set(ROOMS, &room.room_no, to_document(room)?)
            .await?;
        tracing::info!(room_no = %room.room_no, "room added");
        Ok(())
    }

    pub async fn update_room(&self, room: &Room) -> Result<(), AppError> {
        if room.capacity == 0 {
            return Err(AppError::validation("capacity must be at least 1"));
        }
        if !self
            .store
            .merge(ROOMS, &room.room_no, to_document(room)?)
            .await?
        {
            return Err(AppError::not_found(format!("room {}", room.room_no)));
        }
        Ok(())
    }

    pub async fn get_room(&self, room_no: &str) -> Result<Option<Room>, AppError> {
        self.fetch(ROOMS, room_no).await
    }

    pub async fn list_rooms(&self) -> Result<Vec<Room>, AppError> {
        self.fetch_all(ROOMS, &Query::new()).await
    }

    /// Rooms not marked Occupied or Under Maintenance.
    pub async fn available_rooms(&self) -> Result<Vec<Room>, AppError> {
        Ok(self
            .list_rooms()
            .await?
            .into_iter()
            .filter(Room::is_available)
            .collect())
    }

    pub async fn count_rooms(&self, occupied_only: bool) -> Result<u64, AppError> {
        let query = if occupied_only {
            Query::new().eq("status", "Occupied")
        } else {
            Query::new()
        };
        Ok(self.store.count(ROOMS, &query).await?)
    }

    pub async fn delete_room(&self, room_no: &str) -> Result<(), AppError> {
        if !self.store.delete(ROOMS, room_no).await? {
            return Err(AppError::not_found(format!("room {room_no}")));
        }
        tracing::info!(room_no = %room_no, "room deleted");
        Ok(())
    }
}
