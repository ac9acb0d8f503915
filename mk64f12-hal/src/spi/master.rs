use crate::block;
use crate::power::{Clocks, Gate};

use super::{ChipSelect, Config, Error, Fault, Instance, Mcr, Push, Status};

/// The data pins used by an SPI master.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pins<Spi: Instance> {
    pub sck: Spi::Sck,
    pub sout: Spi::Sout,
    pub sin: Spi::Sin,
}

impl<Spi> Pins<Spi>
where
    Spi: Instance,
{
    /// Collect the data pins, switching each to its SPI function.
    #[inline(always)]
    pub fn new(
        sck: impl Into<Spi::Sck>,
        sout: impl Into<Spi::Sout>,
        sin: impl Into<Spi::Sin>,
    ) -> Self {
        Self {
            sck: sck.into(),
            sout: sout.into(),
            sin: sin.into(),
        }
    }
}

/// Words that fit in a single frame.
#[allow(private_bounds)]
pub trait Word: WordSealed + Copy + Default + 'static {
    /// The widest frame this word can hold.
    const BITS: u8;
}

trait WordSealed {
    fn into_frame(self) -> u16;
    fn from_frame(frame: u16) -> Self;
}

impl WordSealed for u8 {
    #[inline(always)]
    fn into_frame(self) -> u16 {
        self as u16
    }

    #[inline(always)]
    fn from_frame(frame: u16) -> Self {
        frame as u8
    }
}

impl Word for u8 {
    const BITS: u8 = 8;
}

impl WordSealed for u16 {
    #[inline(always)]
    fn into_frame(self) -> u16 {
        self
    }

    #[inline(always)]
    fn from_frame(frame: u16) -> Self {
        frame
    }
}

impl Word for u16 {
    const BITS: u8 = 16;
}

/// Frame sources and sinks for one transfer.
trait Frames<W> {
    /// Frames to shift.
    fn count(&self) -> usize;
    /// The word to send as frame `i`.
    fn outgoing(&self, i: usize) -> W;
    /// Store the word received as frame `i`.
    fn incoming(&mut self, i: usize, word: W);
}

/// Separate buffers, padded with zeros or truncated to the longer one.
struct Split<'a, W> {
    tx: &'a [W],
    rx: &'a mut [W],
}

impl<'a, W> Frames<W> for Split<'a, W>
where
    W: Word,
{
    #[inline(always)]
    fn count(&self) -> usize {
        core::cmp::max(self.tx.len(), self.rx.len())
    }

    #[inline(always)]
    fn outgoing(&self, i: usize) -> W {
        self.tx.get(i).copied().unwrap_or_default()
    }

    #[inline(always)]
    fn incoming(&mut self, i: usize, word: W) {
        if let Some(slot) = self.rx.get_mut(i) {
            *slot = word;
        }
    }
}

/// One buffer, overwritten as responses arrive.
impl<W> Frames<W> for [W]
where
    W: Word,
{
    #[inline(always)]
    fn count(&self) -> usize {
        self.len()
    }

    #[inline(always)]
    fn outgoing(&self, i: usize) -> W {
        self[i]
    }

    #[inline(always)]
    fn incoming(&mut self, i: usize, word: W) {
        self[i] = word;
    }
}

/// An SPI peripheral in master mode.
///
/// `Pcs` is `()` when chip select is managed elsewhere, or the
/// instance's `Pcs0` pin to have the hardware drive PCS0 (active low)
/// around each transfer.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Master<Spi: Instance, Pcs = ()> {
    spi: Spi,
    gate: Gate<Spi>,
    pins: Pins<Spi>,
    pcs: Pcs,
    config: Config,
    /// Frames from `write_one` whose responses are not yet read.
    pending: u8,
}

impl<Spi> Master<Spi>
where
    Spi: Instance,
{
    /// Initialize the peripheral as a master without hardware chip
    /// select.
    ///
    /// The configuration starts at its power-on defaults, see
    /// [Config::new].
    #[inline(always)]
    pub fn new(spi: Spi, gate: Gate<Spi>, pins: Pins<Spi>, clocks: &Clocks) -> Result<Self, Error> {
        Self::init(spi, gate, pins, (), clocks)
    }
}

impl<Spi> Master<Spi, Spi::Pcs0>
where
    Spi: Instance,
{
    /// Initialize the peripheral as a master driving PCS0.
    #[inline(always)]
    pub fn new_pcs(
        spi: Spi,
        gate: Gate<Spi>,
        pins: Pins<Spi>,
        pcs: impl Into<Spi::Pcs0>,
        clocks: &Clocks,
    ) -> Result<Self, Error> {
        Self::init(spi, gate, pins, pcs.into(), clocks)
    }
}

impl<Spi, Pcs> Master<Spi, Pcs>
where
    Spi: Instance,
    Pcs: ChipSelect,
{
    fn init(spi: Spi, gate: Gate<Spi>, pins: Pins<Spi>, pcs: Pcs, clocks: &Clocks) -> Result<Self, Error> {
        let mut master = Self {
            spi,
            gate,
            pins,
            pcs,
            config: Config::new(clocks),
            pending: 0,
        };
        master.reset()?;
        Ok(master)
    }

    /// Put the peripheral and the configuration back into their
    /// power-on state.
    ///
    /// Fails if the module does not come up as a master.
    pub fn reset(&mut self) -> Result<(), Error> {
        self.gate.enable();

        let mcr = Mcr::new()
            .with_mstr(true)
            .with_pcsis(0x3f)
            .with_halt(true)
            .with_clr_txf(true)
            .with_clr_rxf(true);
        self.config = Config::for_bus(self.config.get_bus_clock());
        self.pending = 0;

        // safety: we own this spi, we can reset what we want
        unsafe {
            self.spi.write_mcr(mcr);
            self.spi.write_ctar(0, self.config.to_ctar());
            self.spi.clear_status(Status::FLAGS);
        }

        let readback = self.spi.read_mcr();
        if !readback.mstr() || readback.mdis() || !readback.halt() {
            warn!("spi: {} did not come up, MCR {:x}", Spi::NAME, readback.into_bits());
            return Err(Error::HardwareFault(Fault::NotResponding));
        }

        debug!("spi: {} ready, CTAR0 {:x}", Spi::NAME, self.config.to_ctar().into_bits());
        Ok(())
    }

    /// Halt and disable the module, gate off its clock, and give back
    /// the parts.
    #[inline(always)]
    pub fn free(mut self) -> (Spi, Gate<Spi>, Pins<Spi>, Pcs) {
        // safety: we own this spi, and are giving it up
        unsafe {
            self.spi.write_mcr(
                self.spi
                    .read_mcr()
                    .with_halt(true)
                    .with_mdis(true)
                    .with_clr_txf(true)
                    .with_clr_rxf(true),
            );
        }
        self.gate.disable();
        (self.spi, self.gate, self.pins, self.pcs)
    }

    /// The configuration used by the next transfer.
    #[inline(always)]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Change the configuration used by the next transfer.
    #[inline(always)]
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Replace the configuration used by the next transfer.
    #[inline(always)]
    pub fn set_config(&mut self, config: Config) {
        self.config = config;
    }

    #[cfg(test)]
    pub(super) fn peripheral(&self) -> &Spi {
        &self.spi
    }

    /// Load the configuration and start the module with empty FIFOs.
    fn start(&mut self) {
        let mcr = self.spi.read_mcr();
        // safety: we own this spi; CTAR is only written while halted
        unsafe {
            self.spi.write_mcr(mcr.with_halt(true));
            self.spi.write_ctar(0, self.config.to_ctar());
            self.spi
                .write_mcr(mcr.with_halt(true).with_clr_txf(true).with_clr_rxf(true));
            self.spi.clear_status(Status::FLAGS);
            self.spi.write_mcr(mcr.with_halt(false));
        }
        self.pending = 0;
    }

    /// Deassert a chip select left held by an unfinished transfer.
    ///
    /// Queued frames are dropped, and the module is disabled for a moment
    /// so the PCS outputs return to their idle level. The module is left
    /// halted.
    pub(super) fn release_chip_select(&mut self) {
        let mcr = self.spi.read_mcr().with_halt(true);
        // safety: we own this spi
        unsafe {
            self.spi
                .write_mcr(mcr.with_mdis(true).with_clr_txf(true).with_clr_rxf(true));
            self.spi.write_mcr(mcr.with_mdis(false));
            self.spi.clear_status(Status::FLAGS);
        }
        self.pending = 0;
    }

    /// Stop the module after the frame in progress.
    #[inline(always)]
    pub fn halt(&mut self) {
        // safety: we own this spi
        unsafe {
            self.spi.write_mcr(self.spi.read_mcr().with_halt(true));
        }
    }

    /// Is the module running (not halted, no end of queue pending)?
    #[inline(always)]
    pub fn is_running(&self) -> bool {
        self.spi.read_status().txrxs()
    }

    /// Clear both FIFOs.
    #[inline(always)]
    pub fn clear(&mut self) {
        // safety: we own this spi
        unsafe {
            self.spi.write_mcr(
                self.spi
                    .read_mcr()
                    .with_clr_txf(true)
                    .with_clr_rxf(true),
            );
        }
        self.pending = 0;
    }

    /// Clear the RX FIFO.
    #[inline(always)]
    pub fn clear_rx(&mut self) {
        let dropped = self.rx_level();
        // safety: we own this spi
        unsafe {
            self.spi.write_mcr(self.spi.read_mcr().with_clr_rxf(true));
        }
        self.pending = self.pending.saturating_sub(dropped);
    }

    /// Clear the TX FIFO.
    #[inline(always)]
    pub fn clear_tx(&mut self) {
        let dropped = self.tx_level();
        // safety: we own this spi
        unsafe {
            self.spi.write_mcr(self.spi.read_mcr().with_clr_txf(true));
        }
        self.pending = self.pending.saturating_sub(dropped);
    }

    /// Get the RX FIFO level, 0 is empty.
    #[inline(always)]
    pub fn rx_level(&self) -> u8 {
        self.spi.read_status().rxctr()
    }

    /// Get the TX FIFO level, 0 is empty.
    #[inline(always)]
    pub fn tx_level(&self) -> u8 {
        self.spi.read_status().txctr()
    }

    /// Report error flags raised since the last start.
    #[inline(always)]
    fn check(status: Status) -> Result<(), Error> {
        if status.tfuf() {
            warn!("spi: {} TX underflow", Spi::NAME);
            Err(Error::HardwareFault(Fault::TxUnderflow))
        } else if status.rfof() {
            warn!("spi: {} RX overflow", Spi::NAME);
            Err(Error::HardwareFault(Fault::RxOverflow))
        } else {
            Ok(())
        }
    }

    /// Shift every frame of `frames`, keeping at most a FIFO's worth in
    /// flight so responses are never dropped.
    ///
    /// With `hold`, chip select stays asserted after the last frame.
    fn run<W, F>(&mut self, frames: &mut F, hold: bool) -> Result<(), Error>
    where
        W: Word,
        F: Frames<W> + ?Sized,
    {
        let count = frames.count();
        if count == 0 {
            return Ok(());
        }

        let bits = self.config.get_frame_size();
        if bits > W::BITS {
            warn!("spi: {} bit frames do not fit in {} bit words", bits, W::BITS);
            return Err(Error::InvalidConfig);
        }
        let mask = ((1u32 << bits) - 1) as u16;

        trace!("spi: {} transfer of {} frames", Spi::NAME, count);
        self.start();

        let depth = Spi::FIFO_DEPTH as usize;
        let timeout = self.config.get_timeout();
        let mut tx = 0;
        let mut rx = 0;
        let mut idle = 0;

        let result = loop {
            if rx >= count {
                break Ok(());
            }

            let status = self.spi.read_status();
            if let Err(e) = Self::check(status) {
                break Err(e);
            }

            let mut progress = false;

            if status.rxctr() > 0 {
                // safety: we own this spi, and the FIFO is not empty
                let word = unsafe { self.spi.pop() } as u16 & mask;
                frames.incoming(rx, W::from_frame(word));
                rx += 1;
                progress = true;
            }

            if tx < count && tx - rx < depth && (status.txctr() as usize) < depth {
                let last = tx + 1 == count;
                let cmd = Push::new()
                    .with_cont(!last || hold)
                    .with_eoq(last && !hold)
                    .with_ctcnt(tx == 0)
                    .with_ctas(0)
                    .with_pcs(Pcs::MASK)
                    .with_txdata(frames.outgoing(tx).into_frame() & mask);
                // safety: we own this spi, and the FIFO has room
                unsafe { self.spi.push(cmd) };
                tx += 1;
                progress = true;
            }

            if progress {
                idle = 0;
            } else {
                idle += 1;
                if idle >= timeout {
                    warn!("spi: {} timed out, {} of {} frames", Spi::NAME, rx, count);
                    break Err(Error::Timeout);
                }
            }
        };

        self.halt();
        if result.is_err() {
            self.clear();
        }
        // safety: we own this spi
        unsafe { self.spi.clear_status(Status::FLAGS) };
        result
    }

    /// Send `tx` and receive the same number of frames into `rx`,
    /// blocking until done.
    ///
    /// The longer buffer sets the frame count. If `tx` is shorter,
    /// zeros are sent after it. If `rx` is shorter, the extra
    /// responses are discarded. Frame size must fit in `W`.
    #[inline]
    pub fn transfer_blocking<W>(&mut self, tx: &[W], rx: &mut [W]) -> Result<(), Error>
    where
        W: Word,
    {
        self.run(&mut Split { tx, rx }, false)
    }

    /// As [transfer_blocking](Self::transfer_blocking), but with chip
    /// select optionally held after the last frame.
    #[inline]
    pub(super) fn transfer_held<W>(&mut self, tx: &[W], rx: &mut [W], hold: bool) -> Result<(), Error>
    where
        W: Word,
    {
        self.run(&mut Split { tx, rx }, hold)
    }

    /// Write and read simultaneously, overwriting the buffer.
    #[inline]
    pub fn transfer_in_place<W>(&mut self, words: &mut [W]) -> Result<(), Error>
    where
        W: Word,
    {
        self.run(words, false)
    }

    #[inline]
    pub(super) fn transfer_in_place_held<W>(&mut self, words: &mut [W], hold: bool) -> Result<(), Error>
    where
        W: Word,
    {
        self.run(words, hold)
    }

    /// Write and read simultaneously. See
    /// [transfer_blocking](Self::transfer_blocking) for lengths.
    #[inline]
    pub fn transfer<W>(&mut self, read: &mut [W], write: &[W]) -> Result<(), Error>
    where
        W: Word,
    {
        self.transfer_blocking(write, read)
    }

    /// Read into a buffer, sending zeros.
    #[inline]
    pub fn read<W>(&mut self, words: &mut [W]) -> Result<(), Error>
    where
        W: Word,
    {
        self.transfer_blocking(&[], words)
    }

    /// Write a buffer, discarding responses.
    #[inline]
    pub fn write<W>(&mut self, words: &[W]) -> Result<(), Error>
    where
        W: Word,
    {
        self.transfer_blocking(words, &mut [])
    }

    /// Write a single frame, starting the module if it is halted.
    ///
    /// Each frame written must be followed by a
    /// [read_one](Self::read_one) to collect its response.
    #[inline]
    pub fn write_one<W>(&mut self, word: W) -> block::Result<(), Error>
    where
        W: Word,
    {
        let bits = self.config.get_frame_size();
        if bits > W::BITS {
            return Err(block::Error::Other(Error::InvalidConfig));
        }

        if self.spi.read_mcr().halt() {
            self.start();
        }

        Self::check(self.spi.read_status())?;
        // a frame in the shift register shows in neither FIFO count
        if self.pending >= Spi::FIFO_DEPTH {
            return Err(block::Error::WouldBlock);
        }

        let mask = ((1u32 << bits) - 1) as u16;
        let cmd = Push::new()
            .with_pcs(Pcs::MASK)
            .with_txdata(word.into_frame() & mask);
        // safety: we own this spi, and the FIFO has room
        unsafe { self.spi.push(cmd) };
        self.pending += 1;
        Ok(())
    }

    /// Read a single frame received after a
    /// [write_one](Self::write_one).
    #[inline]
    pub fn read_one<W>(&mut self) -> block::Result<W, Error>
    where
        W: Word,
    {
        let status = self.spi.read_status();
        Self::check(status)?;
        if status.rxctr() == 0 {
            return Err(block::Error::WouldBlock);
        }

        let mask = ((1u32 << self.config.get_frame_size()) - 1) as u16;
        // safety: we own this spi, and the FIFO is not empty
        let word = unsafe { self.spi.pop() } as u16 & mask;
        self.pending = self.pending.saturating_sub(1);
        Ok(W::from_frame(word))
    }

    /// Wait for all written frames to be shifted out.
    #[inline]
    pub fn flush(&mut self) -> block::Result<(), Error> {
        let status = self.spi.read_status();
        Self::check(status)?;
        if status.txctr() > 0 {
            Err(block::Error::WouldBlock)
        } else {
            Ok(())
        }
    }
}
