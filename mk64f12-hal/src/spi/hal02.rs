use embedded_hal_02::blocking::spi as hal02blocking;
use embedded_hal_02::spi as hal02;

use crate::block;

use super::{Error, Instance, Master, Word};

impl<Spi, W> hal02::FullDuplex<W> for Master<Spi, ()>
where
    Spi: Instance,
    W: Word,
{
    type Error = Error;

    fn read(&mut self) -> block::Result<W, Self::Error> {
        Master::read_one(self)
    }

    fn send(&mut self, word: W) -> block::Result<(), Self::Error> {
        Master::write_one(self, word)
    }
}

impl<Spi, W> hal02blocking::Transactional<W> for Master<Spi, ()>
where
    Spi: Instance,
    W: Word,
{
    type Error = Error;

    fn exec(&mut self, operations: &mut [hal02blocking::Operation<W>]) -> Result<(), Self::Error> {
        use hal02blocking::Operation;

        for op in operations.iter_mut() {
            match op {
                Operation::Write(buf) => {
                    Master::write(self, buf)?;
                }
                Operation::Transfer(buf) => {
                    Master::transfer_in_place(self, buf)?;
                }
            }
        }

        Ok(())
    }
}

// embedded-hal has blanket impls of these for any FullDuplex, so
// they are implemented per word type rather than for W: Word
macro_rules! blocking_impl {
    ($($word:ty),+) => {$(
        impl<Spi> hal02blocking::Transfer<$word> for Master<Spi, ()>
        where
            Spi: Instance,
        {
            type Error = Error;

            fn transfer<'w>(&mut self, words: &'w mut [$word]) -> Result<&'w [$word], Self::Error> {
                Master::transfer_in_place(self, words)?;
                Ok(words)
            }
        }

        impl<Spi> hal02blocking::Write<$word> for Master<Spi, ()>
        where
            Spi: Instance,
        {
            type Error = Error;

            fn write(&mut self, words: &[$word]) -> Result<(), Self::Error> {
                Master::write(self, words)
            }
        }

        impl<Spi> hal02blocking::WriteIter<$word> for Master<Spi, ()>
        where
            Spi: Instance,
        {
            type Error = Error;

            fn write_iter<WI>(&mut self, words: WI) -> Result<(), Self::Error>
            where
                WI: IntoIterator<Item = $word>,
            {
                write_chunks(self, words.into_iter())
            }
        }
    )+};
}

blocking_impl!(u8, u16);

/// Room for a full FIFO on any DSPI instance.
const MAX_FIFO_DEPTH: usize = 4;

/// Send `words` in FIFO-sized chunks, held together as one transfer.
fn write_chunks<Spi, W>(spi: &mut Master<Spi, ()>, words: impl Iterator<Item = W>) -> Result<(), Error>
where
    Spi: Instance,
    W: Word,
{
    let mut words = words.peekable();
    let mut buf = [W::default(); MAX_FIFO_DEPTH];
    let chunk = &mut buf[..core::cmp::min(Spi::FIFO_DEPTH as usize, MAX_FIFO_DEPTH)];
    while words.peek().is_some() {
        let mut len = 0;
        for (slot, word) in chunk.iter_mut().zip(words.by_ref()) {
            *slot = word;
            len += 1;
        }
        let hold = words.peek().is_some();
        spi.transfer_held(&chunk[..len], &mut [], hold)?;
    }
    Ok(())
}
