//! Typed values for the DSPI registers the driver touches.
//!
//! Bit positions follow the K64 reference manual, chapter "Serial
//! Peripheral Interface (SPI)". Only master-mode layouts are
//! described.

use bitfield_struct::bitfield;

/// MCR, module configuration.
///
/// `clr_txf` and `clr_rxf` always read as zero; writing one flushes
/// the FIFO.
#[cfg_attr(not(feature = "defmt"), bitfield(u32))]
#[cfg_attr(feature = "defmt", bitfield(u32, defmt = true))]
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Mcr {
    /// Stop transfers.
    pub halt: bool,
    #[bits(7)]
    __: u8,
    /// Sample point, in system clocks after the SCK edge.
    #[bits(2)]
    pub smpl_pt: u8,
    /// Flush the RX FIFO.
    pub clr_rxf: bool,
    /// Flush the TX FIFO.
    pub clr_txf: bool,
    /// Disable the receive FIFO.
    pub dis_rxf: bool,
    /// Disable the transmit FIFO.
    pub dis_txf: bool,
    /// Module disable.
    pub mdis: bool,
    /// Doze enable.
    pub doze: bool,
    /// Peripheral chip select inactive state, one bit per PCS.
    #[bits(6)]
    pub pcsis: u8,
    #[bits(2)]
    __: u8,
    /// Receive FIFO overflow overwrite enable.
    pub rooe: bool,
    /// Peripheral chip select strobe enable.
    pub pcsse: bool,
    /// Modified timing format enable.
    pub mtfe: bool,
    /// Freeze in debug mode.
    pub frz: bool,
    /// SPI configuration, 0 for SPI.
    #[bits(2)]
    pub dconf: u8,
    /// Continuous SCK enable.
    pub cont_scke: bool,
    /// Master mode.
    pub mstr: bool,
}

/// CTARn, clock and transfer attributes in master mode.
#[cfg_attr(not(feature = "defmt"), bitfield(u32))]
#[cfg_attr(feature = "defmt", bitfield(u32, defmt = true))]
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ctar {
    /// Baud rate scaler index.
    #[bits(4)]
    pub br: u8,
    /// Delay after transfer scaler index.
    #[bits(4)]
    pub dt: u8,
    /// After SCK delay scaler index.
    #[bits(4)]
    pub asc: u8,
    /// PCS to SCK delay scaler index.
    #[bits(4)]
    pub cssck: u8,
    /// Baud rate prescaler index.
    #[bits(2)]
    pub pbr: u8,
    /// Delay after transfer prescaler index.
    #[bits(2)]
    pub pdt: u8,
    /// After SCK delay prescaler index.
    #[bits(2)]
    pub pasc: u8,
    /// PCS to SCK delay prescaler index.
    #[bits(2)]
    pub pcssck: u8,
    /// LSB first.
    pub lsbfe: bool,
    /// Clock phase, data changed on the leading edge.
    pub cpha: bool,
    /// Clock polarity, inactive high.
    pub cpol: bool,
    /// Frame size minus one.
    #[bits(4)]
    pub fmsz: u8,
    /// Double baud rate.
    pub dbr: bool,
}

/// SR, status. Flags are write-1-to-clear.
#[cfg_attr(not(feature = "defmt"), bitfield(u32))]
#[cfg_attr(feature = "defmt", bitfield(u32, defmt = true))]
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Status {
    /// Pointer to the next RX FIFO entry to pop.
    #[bits(4)]
    pub popnxtptr: u8,
    /// Number of entries in the RX FIFO.
    #[bits(4)]
    pub rxctr: u8,
    /// Pointer to the next TX FIFO entry to transmit.
    #[bits(4)]
    pub txnxtptr: u8,
    /// Number of entries in the TX FIFO.
    #[bits(4)]
    pub txctr: u8,
    __: bool,
    /// RX FIFO drain flag, RX FIFO is not empty.
    pub rfdf: bool,
    __: bool,
    /// RX FIFO overflow.
    pub rfof: bool,
    #[bits(5)]
    __: u8,
    /// TX FIFO fill flag, TX FIFO is not full.
    pub tfff: bool,
    __: bool,
    /// TX FIFO underflow.
    pub tfuf: bool,
    /// End of queue, the last frame with EOQ set has been sent.
    pub eoqf: bool,
    __: bool,
    /// TX and RX status, the module is running.
    pub txrxs: bool,
    /// Transfer complete.
    pub tcf: bool,
}

impl Status {
    /// Every write-1-to-clear flag.
    pub const FLAGS: Self = Self::new()
        .with_tcf(true)
        .with_eoqf(true)
        .with_tfuf(true)
        .with_tfff(true)
        .with_rfof(true)
        .with_rfdf(true);
}

/// PUSHR, a TX FIFO command and data word in master mode.
#[cfg_attr(not(feature = "defmt"), bitfield(u32))]
#[cfg_attr(feature = "defmt", bitfield(u32, defmt = true))]
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Push {
    /// Data to transmit.
    #[bits(16)]
    pub txdata: u16,
    /// Chip selects to assert, one bit per PCS.
    #[bits(6)]
    pub pcs: u8,
    #[bits(4)]
    __: u8,
    /// Clear the transfer counter before this frame.
    pub ctcnt: bool,
    /// End of queue.
    pub eoq: bool,
    /// Which CTAR to use for this frame.
    #[bits(3)]
    pub ctas: u8,
    /// Keep chip selects asserted after this frame.
    pub cont: bool,
}
