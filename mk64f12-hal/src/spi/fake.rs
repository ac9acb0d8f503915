//! A simulated DSPI for host tests.
//!
//! Frames pushed while the module runs are shifted at once and their
//! responses land in the RX FIFO, masked to the frame size of the
//! CTAR they name. By default every frame is echoed back.

extern crate std;

use core::cell::{Ref, RefCell, RefMut};
use core::sync::atomic::{AtomicBool, Ordering};
use std::boxed::Box;
use std::collections::VecDeque;
use std::vec::Vec;

use crate::power::{Clocks, Device, Gate, Sealed};

use super::instance::{ChipSelectSealed, InstanceSealed};
use super::{ChipSelect, Ctar, Fault, Instance, Master, Mcr, Pins, Push, Status};

static ENABLED: AtomicBool = AtomicBool::new(false);

/// Register state of the simulated module.
pub(super) struct FakeState {
    pub mcr: Mcr,
    pub ctar: [Ctar; 2],
    pub flags: Status,
    pub tx: VecDeque<Push>,
    pub rx: VecDeque<u32>,

    /// Every command accepted into the TX FIFO.
    pub pushes: Vec<Push>,
    /// Every CTAR write, by index.
    pub ctar_writes: Vec<(usize, Ctar)>,
    /// Most frames ever waiting in both FIFOs at once.
    pub max_in_flight: usize,
    /// PCS is driven active.
    pub pcs_asserted: bool,

    /// Never shift frames.
    pub stalled: bool,
    /// Ignore MCR writes.
    pub dead: bool,
    /// Raise this fault on the next shifted frame.
    pub inject: Option<Fault>,
    responder: Option<Box<dyn FnMut(u16) -> u16>>,
}

#[derive(Debug)]
pub(super) struct FakeSpi {
    state: RefCell<FakeState>,
}

impl core::fmt::Debug for FakeState {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("FakeState")
            .field("mcr", &self.mcr)
            .field("tx", &self.tx.len())
            .field("rx", &self.rx.len())
            .finish()
    }
}

/// Stand-in for a PCS0 pin.
#[derive(Debug)]
pub(super) struct FakePcs;

impl ChipSelectSealed for FakePcs {}
impl ChipSelect for FakePcs {
    const MASK: u8 = 1;
}

impl FakeSpi {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(FakeState {
                mcr: Mcr::from_bits(0x0000_4001),
                ctar: [Ctar::from_bits(0x7800_0000); 2],
                flags: Status::new(),
                tx: VecDeque::new(),
                rx: VecDeque::new(),
                pushes: Vec::new(),
                ctar_writes: Vec::new(),
                max_in_flight: 0,
                pcs_asserted: false,
                stalled: false,
                dead: false,
                inject: None,
                responder: None,
            }),
        }
    }

    pub fn pins() -> Pins<Self> {
        Pins::new((), (), ())
    }

    pub fn master(self) -> Master<Self> {
        // safety: the fake gate is a plain flag
        let gate = unsafe { Gate::steal() };
        Master::new(self, gate, Self::pins(), &Clocks::reset()).unwrap()
    }

    pub fn master_pcs(self) -> Master<Self, FakePcs> {
        // safety: the fake gate is a plain flag
        let gate = unsafe { Gate::steal() };
        Master::new_pcs(self, gate, Self::pins(), FakePcs, &Clocks::reset()).unwrap()
    }

    pub fn state(&self) -> Ref<'_, FakeState> {
        self.state.borrow()
    }

    pub fn state_mut(&self) -> RefMut<'_, FakeState> {
        self.state.borrow_mut()
    }

    /// Answer each frame with `f` instead of echoing it.
    pub fn respond(&self, f: impl FnMut(u16) -> u16 + 'static) {
        self.state_mut().responder = Some(Box::new(f));
    }
}

impl FakeState {
    fn depth() -> usize {
        <FakeSpi as InstanceSealed>::FIFO_DEPTH as usize
    }

    /// Shift out everything in the TX FIFO, if running.
    fn shift(&mut self) {
        if self.mcr.halt() || self.mcr.mdis() || self.stalled {
            return;
        }

        while let Some(cmd) = self.tx.pop_front() {
            match self.inject.take() {
                Some(Fault::TxUnderflow) => self.flags.set_tfuf(true),
                Some(Fault::RxOverflow) => self.flags.set_rfof(true),
                _ => (),
            }

            let bits = self.ctar[cmd.ctas() as usize & 1].fmsz() as u32 + 1;
            let mask = ((1u32 << bits) - 1) as u16;
            let out = cmd.txdata() & mask;
            let response = match self.responder.as_mut() {
                Some(f) => f(out),
                None => out,
            } & mask;

            if self.rx.len() < Self::depth() {
                self.rx.push_back(response as u32);
            } else {
                self.flags.set_rfof(true);
            }

            if cmd.pcs() != 0 {
                self.pcs_asserted = cmd.cont();
            }

            self.flags.set_tcf(true);
            if cmd.eoq() {
                self.flags.set_eoqf(true);
            }
        }
    }
}

impl InstanceSealed for FakeSpi {
    const FIFO_DEPTH: u8 = 4;

    fn read_mcr(&self) -> Mcr {
        self.state().mcr
    }

    unsafe fn write_mcr(&self, mcr: Mcr) {
        let mut s = self.state_mut();
        if s.dead {
            return;
        }
        if mcr.clr_txf() {
            s.tx.clear();
        }
        if mcr.clr_rxf() {
            s.rx.clear();
        }
        if mcr.mdis() {
            s.pcs_asserted = false;
        }
        s.mcr = mcr.with_clr_txf(false).with_clr_rxf(false);
        s.shift();
    }

    unsafe fn write_ctar(&self, n: usize, ctar: Ctar) {
        let mut s = self.state_mut();
        s.ctar[n] = ctar;
        s.ctar_writes.push((n, ctar));
    }

    fn read_status(&self) -> Status {
        let s = self.state();
        s.flags
            .with_txctr(s.tx.len() as u8)
            .with_rxctr(s.rx.len() as u8)
            .with_tfff(s.tx.len() < FakeState::depth())
            .with_rfdf(!s.rx.is_empty())
            .with_txrxs(!s.mcr.halt() && !s.mcr.mdis())
    }

    unsafe fn clear_status(&self, flags: Status) {
        let mut s = self.state_mut();
        let cleared = s.flags.into_bits() & !flags.into_bits();
        s.flags = Status::from_bits(cleared);
    }

    unsafe fn push(&self, cmd: Push) {
        let mut s = self.state_mut();
        if s.tx.len() >= FakeState::depth() {
            s.flags.set_tfuf(true);
            return;
        }
        s.tx.push_back(cmd);
        s.pushes.push(cmd);
        let in_flight = s.tx.len() + s.rx.len();
        s.max_in_flight = s.max_in_flight.max(in_flight);
        s.shift();
    }

    unsafe fn pop(&self) -> u32 {
        self.state_mut().rx.pop_front().unwrap_or(0)
    }
}

impl Sealed for FakeSpi {}

impl Device for FakeSpi {
    const NAME: &'static str = "FakeSpi";

    unsafe fn set_enabled(enabled: bool) {
        ENABLED.store(enabled, Ordering::SeqCst);
    }

    fn is_enabled() -> bool {
        ENABLED.load(Ordering::SeqCst)
    }

    #[cfg(feature = "defmt")]
    fn defmt(f: defmt::Formatter) {
        defmt::write!(f, "FakeSpi");
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for FakeSpi {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "FakeSpi");
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for FakePcs {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "FakePcs");
    }
}

impl Instance for FakeSpi {
    type Sck = ();
    type Sout = ();
    type Sin = ();
    type Pcs0 = FakePcs;
}
