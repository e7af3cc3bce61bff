use bytes::Bytes;
use scalelink_codec::command::{
    DELETE_PLU, PLU_ID_LEN, PLU_READ_LEN, READ_FACTORY_SETTINGS, READ_PLU, READ_STATUS,
    READ_TOTAL_SALES, READ_USER_SETTINGS, RESET_TOTAL_SALES, STATUS_LEN, TOTAL_SALES_LEN,
    WRITE_PLU, WRITE_USER_SETTINGS,
};
use scalelink_codec::{
    CommandFrame, LiveStatus, PluEntry, PluRecord, Response, SettingsBlock, SettingsKind,
    TotalSales,
};
use scalelink_transport::LinkOpener;
use tracing::{debug, info};

use crate::config::ScaleConfig;
use crate::error::{Result, ScaleError};
use crate::reconnect::{ReconnectController, ReconnectOutcome};
use crate::session::{Session, SessionState};

/// Record-level operations on one scale.
///
/// Every operation fails with [`ScaleError::NotReady`] before touching the
/// port if the session is not ready. Callers are expected to call
/// [`try_reconnect`](Self::try_reconnect) on their next cycle.
#[derive(Debug)]
pub struct ScaleClient {
    session: Session,
    reconnect: ReconnectController,
}

impl ScaleClient {
    /// A disconnected client. Call [`connect`](Self::connect) before use.
    pub fn new(config: ScaleConfig, opener: impl LinkOpener + 'static) -> Self {
        let reconnect = ReconnectController::from_config(&config);
        Self {
            session: Session::new(config, opener),
            reconnect,
        }
    }

    /// A disconnected client on a real serial port.
    pub fn serial(config: ScaleConfig) -> Self {
        let reconnect = ReconnectController::from_config(&config);
        Self {
            session: Session::serial(config),
            reconnect,
        }
    }

    pub fn connect(&mut self) -> Result<()> {
        self.session.connect()
    }

    pub fn disconnect(&mut self) {
        self.session.disconnect();
        info!(port = %self.session.config().serial.port, "disconnected");
    }

    pub fn is_ready(&self) -> bool {
        self.session.is_ready()
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Rate-limited reconnect; see [`ReconnectController`].
    pub fn try_reconnect(&mut self) -> ReconnectOutcome {
        self.reconnect.try_reconnect(&mut self.session)
    }

    /// Read one PLU.
    ///
    /// An unused slot is reported as [`ScaleError::EmptyResult`].
    pub fn get_plu(&mut self, id: u32) -> Result<PluRecord> {
        self.ensure_ready()?;
        let frame = CommandFrame::read(READ_PLU, id_payload(id), PLU_READ_LEN);
        let record = PluRecord::decode(&self.fetch(&frame)?)?;
        if record.is_empty_slot() {
            debug!(id, "PLU slot is empty");
            return Err(ScaleError::EmptyResult);
        }
        Ok(record)
    }

    /// Store a PLU, replacing whatever occupies its slot.
    pub fn create_plu(&mut self, entry: &PluEntry) -> Result<()> {
        self.ensure_ready()?;
        let payload = entry.encode()?;
        self.command(&CommandFrame::ack(WRITE_PLU, payload))?;
        info!(id = entry.id, "PLU stored");
        Ok(())
    }

    pub fn delete_plu(&mut self, id: u32) -> Result<()> {
        self.ensure_ready()?;
        self.command(&CommandFrame::ack(DELETE_PLU, id_payload(id)))?;
        info!(id, "PLU deleted");
        Ok(())
    }

    pub fn get_total_sales(&mut self) -> Result<TotalSales> {
        self.ensure_ready()?;
        let frame = CommandFrame::read(READ_TOTAL_SALES, Bytes::new(), TOTAL_SALES_LEN);
        Ok(TotalSales::decode(&self.fetch(&frame)?)?)
    }

    pub fn reset_total_sales(&mut self) -> Result<()> {
        self.ensure_ready()?;
        self.command(&CommandFrame::ack(RESET_TOTAL_SALES, Bytes::new()))?;
        info!("total sales reset");
        Ok(())
    }

    pub fn get_status(&mut self) -> Result<LiveStatus> {
        self.ensure_ready()?;
        let frame = CommandFrame::read(READ_STATUS, Bytes::new(), STATUS_LEN);
        Ok(LiveStatus::decode(&self.fetch(&frame)?)?)
    }

    pub fn get_user_settings(&mut self) -> Result<SettingsBlock> {
        self.read_settings(SettingsKind::User, READ_USER_SETTINGS)
    }

    pub fn get_factory_settings(&mut self) -> Result<SettingsBlock> {
        self.read_settings(SettingsKind::Factory, READ_FACTORY_SETTINGS)
    }

    /// Write a raw user settings block. Factory settings are read-only.
    pub fn set_user_settings(&mut self, raw: &[u8]) -> Result<()> {
        self.ensure_ready()?;
        let payload = SettingsBlock::decode(SettingsKind::User, raw)?.encode()?;
        self.command(&CommandFrame::ack(WRITE_USER_SETTINGS, payload))?;
        info!("user settings written");
        Ok(())
    }

    fn read_settings(&mut self, kind: SettingsKind, command: u8) -> Result<SettingsBlock> {
        self.ensure_ready()?;
        let frame = CommandFrame::read(command, Bytes::new(), kind.block_len());
        Ok(SettingsBlock::decode(kind, &self.fetch(&frame)?)?)
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.session.is_ready() {
            Ok(())
        } else {
            Err(ScaleError::NotReady)
        }
    }

    /// Exchange a read-style frame and return its record bytes.
    fn fetch(&mut self, frame: &CommandFrame) -> Result<Bytes> {
        match self.session.exchange(frame)? {
            Response::Payload(bytes) => Ok(bytes),
            Response::Error => Err(ScaleError::DeviceError {
                command: frame.name(),
            }),
            Response::Ack => Err(ScaleError::ProtocolViolation(format!(
                "{} answered with a bare ack",
                frame.name()
            ))),
        }
    }

    /// Exchange an ack-style frame.
    fn command(&mut self, frame: &CommandFrame) -> Result<()> {
        match self.session.exchange(frame)? {
            Response::Ack => Ok(()),
            Response::Error => Err(ScaleError::DeviceError {
                command: frame.name(),
            }),
            Response::Payload(_) => Err(ScaleError::ProtocolViolation(format!(
                "{} answered with a record",
                frame.name()
            ))),
        }
    }
}

fn id_payload(id: u32) -> Bytes {
    let raw: [u8; PLU_ID_LEN] = id.to_le_bytes();
    Bytes::copy_from_slice(&raw)
}
