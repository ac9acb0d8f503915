use embedded_hal_1::spi as hal1;
use embedded_hal_nb::spi as hal1nb;

use crate::block;

use super::{ChipSelect, Error, Fault, Instance, Master, Word};

impl hal1::Error for Error {
    #[inline(always)]
    fn kind(&self) -> hal1::ErrorKind {
        match self {
            Error::HardwareFault(Fault::RxOverflow) => hal1::ErrorKind::Overrun,
            _ => hal1::ErrorKind::Other,
        }
    }
}

impl<Spi, Pcs> hal1::ErrorType for Master<Spi, Pcs>
where
    Spi: Instance,
    Pcs: ChipSelect,
{
    type Error = Error;
}

impl<Spi, W> hal1::SpiBus<W> for Master<Spi, ()>
where
    Spi: Instance,
    W: Word,
{
    #[inline(always)]
    fn read(&mut self, words: &mut [W]) -> Result<(), Self::Error> {
        Master::read(self, words)
    }

    #[inline(always)]
    fn write(&mut self, words: &[W]) -> Result<(), Self::Error> {
        Master::write(self, words)
    }

    #[inline(always)]
    fn transfer(&mut self, read: &mut [W], write: &[W]) -> Result<(), Self::Error> {
        Master::transfer(self, read, write)
    }

    #[inline(always)]
    fn transfer_in_place(&mut self, words: &mut [W]) -> Result<(), Self::Error> {
        Master::transfer_in_place(self, words)
    }

    #[inline(always)]
    fn flush(&mut self) -> Result<(), Self::Error> {
        block::block!(Master::flush(self))
    }
}

/// Frames shifted by one transaction operation.
fn frames<W>(op: &hal1::Operation<'_, W>) -> usize {
    match op {
        hal1::Operation::Read(buf) => buf.len(),
        hal1::Operation::Write(buf) => buf.len(),
        hal1::Operation::Transfer(read, write) => core::cmp::max(read.len(), write.len()),
        hal1::Operation::TransferInPlace(buf) => buf.len(),
        hal1::Operation::DelayNs(_) => 0,
    }
}

#[cfg(not(test))]
#[inline(always)]
fn delay_ns(ns: u32) {
    // best effort: at its fastest, the core is 8.33ns / cycle,
    // so round down to 8ns / cycle and take ceil(ns / 8)
    cortex_m::asm::delay(ns.saturating_add(0x7) >> 3);
}

// no cycle counter on the host
#[cfg(test)]
fn delay_ns(_ns: u32) {}

impl<Spi, W> hal1::SpiDevice<W> for Master<Spi, Spi::Pcs0>
where
    Spi: Instance,
    W: Word,
{
    #[inline]
    fn transaction(&mut self, operations: &mut [hal1::Operation<'_, W>]) -> Result<(), Self::Error> {
        block::block!(Master::flush(self))?;

        // PCS0 is held between frames until the last operation that
        // shifts any
        let last = operations.iter().rposition(|op| frames(op) > 0);

        let mut inner = || -> Result<(), Self::Error> {
            for (i, op) in operations.iter_mut().enumerate() {
                let hold = Some(i) != last;
                match op {
                    hal1::Operation::Read(buf) => self.transfer_held(&[], buf, hold)?,
                    hal1::Operation::Write(buf) => self.transfer_held(buf, &mut [], hold)?,
                    hal1::Operation::Transfer(read, write) => self.transfer_held(write, read, hold)?,
                    hal1::Operation::TransferInPlace(buf) => self.transfer_in_place_held(buf, hold)?,
                    hal1::Operation::DelayNs(ns) => delay_ns(*ns),
                }
            }
            Ok(())
        };

        if let Err(e) = inner() {
            self.release_chip_select();
            return Err(e);
        }

        Ok(())
    }
}

impl<Spi, Pcs, W> hal1nb::FullDuplex<W> for Master<Spi, Pcs>
where
    Spi: Instance,
    Pcs: ChipSelect,
    W: Word,
{
    #[inline(always)]
    fn read(&mut self) -> block::Result<W, Self::Error> {
        Master::read_one(self)
    }

    #[inline(always)]
    fn write(&mut self, word: W) -> block::Result<(), Self::Error> {
        Master::write_one(self, word)
    }
}

#[cfg(test)]
mod test {
    use embedded_hal_1::spi::{Error as _, ErrorKind, Operation, SpiBus, SpiDevice};
    use embedded_hal_nb::spi::FullDuplex;

    use super::super::fake::FakeSpi;
    use super::*;

    #[test]
    fn error_kind() {
        assert_eq!(
            ErrorKind::Overrun,
            Error::HardwareFault(Fault::RxOverflow).kind()
        );
        assert_eq!(ErrorKind::Other, Error::Timeout.kind());
        assert_eq!(ErrorKind::Other, Error::InvalidConfig.kind());
    }

    #[test]
    fn bus() {
        let mut spi = FakeSpi::new().master();
        let mut buf = [1u8, 2, 3];
        SpiBus::transfer_in_place(&mut spi, &mut buf).unwrap();
        assert_eq!([1, 2, 3], buf);

        let mut rx = [0u8; 2];
        SpiBus::transfer(&mut spi, &mut rx, &[9, 8, 7]).unwrap();
        assert_eq!([9, 8], rx);
        SpiBus::<u8>::flush(&mut spi).unwrap();
    }

    #[test]
    fn bus_u16() {
        let mut spi = FakeSpi::new().master();
        spi.config_mut().set_frame_size(16).unwrap();
        let mut buf = [0x1234u16, 0xabcd];
        SpiBus::transfer_in_place(&mut spi, &mut buf).unwrap();
        assert_eq!([0x1234, 0xabcd], buf);
    }

    #[test]
    fn device_holds_chip_select() {
        let mut spi = FakeSpi::new().master_pcs();
        let mut rx = [0u8; 2];
        spi.transaction(&mut [Operation::Write(&[0x03, 0x00]), Operation::Read(&mut rx)])
            .unwrap();
        assert_eq!([0, 0], rx);

        let pushes = spi.peripheral().state().pushes.clone();
        assert_eq!(4, pushes.len());
        // held across the operations, released after the last frame
        assert!(pushes[..3].iter().all(|p| p.cont() && !p.eoq()));
        assert!(!pushes[3].cont() && pushes[3].eoq());
        assert!(pushes.iter().all(|p| p.pcs() == 1));
    }

    #[test]
    fn device_empty_last_operation() {
        let mut spi = FakeSpi::new().master_pcs();
        spi.transaction(&mut [Operation::Write(&[1u8, 2]), Operation::Write(&[])])
            .unwrap();

        let state = spi.peripheral().state();
        assert_eq!(2, state.pushes.len());
        assert!(state.pushes[0].cont());
        assert!(!state.pushes[1].cont() && state.pushes[1].eoq());
        assert!(!state.pcs_asserted);
    }

    #[test]
    fn device_error_releases_chip_select() {
        let mut spi = FakeSpi::new().master_pcs();
        let mut rx = [0u8; 2];
        spi.transaction(&mut [Operation::Write(&[1, 2]), Operation::Read(&mut rx)])
            .unwrap();
        spi.peripheral().state_mut().inject = Some(Fault::RxOverflow);
        assert_eq!(
            Err(Error::HardwareFault(Fault::RxOverflow)),
            spi.transaction(&mut [Operation::Write(&[1, 2]), Operation::Read(&mut rx)])
        );
        {
            let state = spi.peripheral().state();
            assert!(!state.pcs_asserted);
            assert!(state.mcr.halt());
        }

        // the next transaction selects the device afresh
        let start = spi.peripheral().state().pushes.len();
        spi.transaction(&mut [Operation::Write(&[3u8])]).unwrap();
        let state = spi.peripheral().state();
        assert!(state.pushes[start].ctcnt() && state.pushes[start].eoq());
        assert!(!state.pcs_asserted);
    }

    #[test]
    fn device_delay_after_last_write() {
        let mut spi = FakeSpi::new().master_pcs();
        spi.transaction(&mut [Operation::Write(&[1u8, 2]), Operation::DelayNs(100)])
            .unwrap();

        let state = spi.peripheral().state();
        assert_eq!(2, state.pushes.len());
        assert!(state.pushes[0].cont());
        assert!(!state.pushes[1].cont() && state.pushes[1].eoq());
        assert!(!state.pcs_asserted);
    }

    #[test]
    fn device_only_delays() {
        let mut spi = FakeSpi::new().master_pcs();
        SpiDevice::<u8>::transaction(&mut spi, &mut [Operation::DelayNs(10), Operation::DelayNs(20)])
            .unwrap();

        let state = spi.peripheral().state();
        assert!(state.pushes.is_empty());
        assert!(!state.pcs_asserted);
    }

    #[test]
    fn full_duplex() {
        let mut spi = FakeSpi::new().master();
        block::block!(FullDuplex::write(&mut spi, 0x5au8)).unwrap();
        let word: u8 = block::block!(FullDuplex::read(&mut spi)).unwrap();
        assert_eq!(0x5a, word);
    }
}
