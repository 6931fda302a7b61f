use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use time::{Date, OffsetDateTime};
use tokio::sync::RwLock;

use shelterline_core::{
    now_utc, BedId, BedStatus, ChapelBooking, ChapelStatus, ConfirmationCode, Reservation,
    ReservationStatus, Volunteer, VolunteerStatus,
};
use shelterline_storage::{
    BedRegistry, BedRow, ChapelStore, GuestDirectory, NewChapelBooking, NewVolunteer,
    ReservationStore, StorageError, VolunteerStore,
};

/// In-memory shelter store.
///
/// Beds live in a `BTreeMap` so snapshots and lowest-id scans come out in
/// id order for free. Reservations are keyed by confirmation code.
#[derive(Debug, Default)]
pub struct InMemoryShelterStore {
    beds: RwLock<BTreeMap<BedId, BedStatus>>,
    reservations: RwLock<HashMap<String, Reservation>>,
    chapel: RwLock<Vec<ChapelBooking>>,
    volunteers: RwLock<Vec<Volunteer>>,
    guests: RwLock<HashMap<BedId, String>>,
    chapel_seq: AtomicU64,
    volunteer_seq: AtomicU64,
}

impl InMemoryShelterStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_chapel_id(&self) -> u64 {
        self.chapel_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn next_volunteer_id(&self) -> u64 {
        self.volunteer_seq.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait]
impl BedRegistry for InMemoryShelterStore {
    async fn initialize(&self) -> Result<(), StorageError> {
        let mut beds = self.beds.write().await;
        for id in BedId::all() {
            beds.entry(id).or_insert(BedStatus::Available);
        }
        Ok(())
    }

    async fn snapshot(&self) -> Result<Vec<BedRow>, StorageError> {
        let beds = self.beds.read().await;
        Ok(beds
            .iter()
            .map(|(&bed_id, &status)| BedRow { bed_id, status })
            .collect())
    }

    async fn get_status(&self, bed_id: BedId) -> Result<BedStatus, StorageError> {
        let beds = self.beds.read().await;
        beds.get(&bed_id)
            .copied()
            .ok_or_else(|| StorageError::not_found("bed", bed_id.to_string()))
    }

    async fn transition(
        &self,
        bed_id: BedId,
        from: BedStatus,
        to: BedStatus,
    ) -> Result<(), StorageError> {
        let mut beds = self.beds.write().await;
        let status = beds
            .get_mut(&bed_id)
            .ok_or_else(|| StorageError::not_found("bed", bed_id.to_string()))?;
        if *status != from {
            return Err(StorageError::conflict(
                "bed",
                bed_id.to_string(),
                from.as_str(),
                status.as_str(),
            ));
        }
        *status = to;
        Ok(())
    }
}

#[async_trait]
impl ReservationStore for InMemoryShelterStore {
    async fn insert(&self, reservation: Reservation) -> Result<(), StorageError> {
        let mut reservations = self.reservations.write().await;
        let key = reservation.code.as_str().to_string();
        if reservations.contains_key(&key) {
            return Err(StorageError::already_exists("reservation", key));
        }
        reservations.insert(key, reservation);
        Ok(())
    }

    async fn get_by_code(
        &self,
        code: &ConfirmationCode,
    ) -> Result<Option<Reservation>, StorageError> {
        let reservations = self.reservations.read().await;
        Ok(reservations.get(code.as_str()).cloned())
    }

    async fn get_active_by_bed(
        &self,
        bed_id: BedId,
    ) -> Result<Option<Reservation>, StorageError> {
        let reservations = self.reservations.read().await;
        Ok(reservations
            .values()
            .find(|r| r.bed_id == bed_id && r.status == ReservationStatus::Active)
            .cloned())
    }

    async fn get_checked_in_by_bed(
        &self,
        bed_id: BedId,
    ) -> Result<Option<Reservation>, StorageError> {
        let reservations = self.reservations.read().await;
        Ok(reservations
            .values()
            .find(|r| r.bed_id == bed_id && r.status == ReservationStatus::CheckedIn)
            .cloned())
    }

    async fn get_active_by_caller_ref(
        &self,
        caller_ref: &str,
    ) -> Result<Option<Reservation>, StorageError> {
        let reservations = self.reservations.read().await;
        Ok(reservations
            .values()
            .find(|r| {
                r.status == ReservationStatus::Active
                    && r.caller_ref.as_deref() == Some(caller_ref)
            })
            .cloned())
    }

    async fn list_active(&self) -> Result<Vec<Reservation>, StorageError> {
        let reservations = self.reservations.read().await;
        let mut active: Vec<Reservation> = reservations
            .values()
            .filter(|r| r.status == ReservationStatus::Active)
            .cloned()
            .collect();
        active.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.code.as_str().cmp(b.code.as_str()))
        });
        Ok(active)
    }

    async fn list_expiring_before(
        &self,
        t: OffsetDateTime,
    ) -> Result<Vec<Reservation>, StorageError> {
        let reservations = self.reservations.read().await;
        let mut expiring: Vec<Reservation> = reservations
            .values()
            .filter(|r| r.status == ReservationStatus::Active && r.expires_at < t)
            .cloned()
            .collect();
        expiring.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.code.as_str().cmp(b.code.as_str()))
        });
        Ok(expiring)
    }

    async fn update_status(
        &self,
        code: &ConfirmationCode,
        expected_status: ReservationStatus,
        new_status: ReservationStatus,
        terminal_at: Option<OffsetDateTime>,
    ) -> Result<Reservation, StorageError> {
        let mut reservations = self.reservations.write().await;
        let reservation = reservations
            .get_mut(code.as_str())
            .ok_or_else(|| StorageError::not_found("reservation", code.as_str()))?;
        if reservation.status != expected_status {
            return Err(StorageError::conflict(
                "reservation",
                code.as_str(),
                expected_status.as_str(),
                reservation.status.as_str(),
            ));
        }
        reservation.status = new_status;
        if new_status.is_terminal() {
            reservation.terminal_at = terminal_at.or_else(|| Some(now_utc()));
        }
        Ok(reservation.clone())
    }

    async fn set_terminal_at(
        &self,
        code: &ConfirmationCode,
        at: OffsetDateTime,
    ) -> Result<(), StorageError> {
        let mut reservations = self.reservations.write().await;
        let reservation = reservations
            .get_mut(code.as_str())
            .ok_or_else(|| StorageError::not_found("reservation", code.as_str()))?;
        reservation.terminal_at = Some(at);
        Ok(())
    }
}

#[async_trait]
impl ChapelStore for InMemoryShelterStore {
    async fn insert_booking(
        &self,
        booking: NewChapelBooking,
    ) -> Result<ChapelBooking, StorageError> {
        let record = ChapelBooking {
            id: self.next_chapel_id(),
            date: booking.date,
            time: booking.time,
            group_name: booking.group_name,
            contact_name: booking.contact_name,
            contact_phone: booking.contact_phone,
            contact_email: booking.contact_email,
            notes: booking.notes,
            status: ChapelStatus::Pending,
            created_at: now_utc(),
        };
        let mut chapel = self.chapel.write().await;
        chapel.push(record.clone());
        Ok(record)
    }

    async fn find_active_by_slot(
        &self,
        date: Date,
        time: &str,
    ) -> Result<Option<ChapelBooking>, StorageError> {
        let chapel = self.chapel.read().await;
        Ok(chapel
            .iter()
            .find(|b| b.date == date && b.time == time && b.occupies_slot())
            .cloned())
    }

    async fn list_bookings(&self) -> Result<Vec<ChapelBooking>, StorageError> {
        let chapel = self.chapel.read().await;
        let mut bookings = chapel.clone();
        bookings.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.time.cmp(&b.time)));
        Ok(bookings)
    }
}

#[async_trait]
impl VolunteerStore for InMemoryShelterStore {
    async fn insert_volunteer(
        &self,
        volunteer: NewVolunteer,
    ) -> Result<Volunteer, StorageError> {
        let record = Volunteer {
            id: self.next_volunteer_id(),
            name: volunteer.name,
            phone: volunteer.phone,
            email: volunteer.email,
            availability: volunteer.availability,
            interests: volunteer.interests,
            status: VolunteerStatus::Pending,
            created_at: now_utc(),
        };
        let mut volunteers = self.volunteers.write().await;
        volunteers.push(record.clone());
        Ok(record)
    }

    async fn list_volunteers(&self) -> Result<Vec<Volunteer>, StorageError> {
        let volunteers = self.volunteers.read().await;
        let mut list = volunteers.clone();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(list)
    }
}

#[async_trait]
impl GuestDirectory for InMemoryShelterStore {
    async fn assign_guest(&self, bed_id: BedId, guest_id: String) -> Result<(), StorageError> {
        let mut guests = self.guests.write().await;
        guests.insert(bed_id, guest_id);
        Ok(())
    }

    async fn assigned_guest(&self, bed_id: BedId) -> Result<Option<String>, StorageError> {
        let guests = self.guests.read().await;
        Ok(guests.get(&bed_id).cloned())
    }
}
