use crate::{block::Block, transaction::Transaction};
use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, ReadRangeExt, Write};
use commonware_cryptography::sha256::Digest;

/// Maximum number of blocks carried by a single reconciliation exchange.
pub const MAX_RECONCILE_BLOCKS: usize = 1024;

/// An event delivered to a node by the external transport.
pub enum Message {
    /// An authorized block propagated by a peer.
    Block(Block),

    /// A transaction relayed by a peer.
    Transaction(Transaction),

    /// Blocks above a shared height, exchanged at reconnection.
    Reconcile(Vec<Block>),
}

impl Write for Message {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Block(block) => {
                0u8.write(writer);
                block.write(writer);
            }
            Self::Transaction(transaction) => {
                1u8.write(writer);
                transaction.write(writer);
            }
            Self::Reconcile(blocks) => {
                2u8.write(writer);
                blocks.write(writer);
            }
        }
    }
}

impl Read for Message {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let message = match reader.get_u8() {
            0 => Self::Block(Block::read(reader)?),
            1 => Self::Transaction(Transaction::read(reader)?),
            2 => Self::Reconcile(Vec::<Block>::read_range(reader, 0..=MAX_RECONCILE_BLOCKS)?),
            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(message)
    }
}

impl EncodeSize for Message {
    fn encode_size(&self) -> usize {
        1 + match self {
            Self::Block(block) => block.encode_size(),
            Self::Transaction(transaction) => transaction.encode_size(),
            Self::Reconcile(blocks) => blocks.encode_size(),
        }
    }
}

/// An inspection request served by a node.
pub enum Query {
    ChainInfo,

    /// The exact bytes the node stores for a txid.
    RawTransaction(Digest),
}

impl Write for Query {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Query::ChainInfo => 0u8.write(writer),
            Query::RawTransaction(txid) => {
                1u8.write(writer);
                txid.write(writer);
            }
        }
    }
}

impl Read for Query {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let kind = u8::read(reader)?;
        match kind {
            0 => Ok(Query::ChainInfo),
            1 => Ok(Query::RawTransaction(Digest::read(reader)?)),
            _ => Err(Error::InvalidEnum(kind)),
        }
    }
}

impl EncodeSize for Query {
    fn encode_size(&self) -> usize {
        1 + match self {
            Query::ChainInfo => 0,
            Query::RawTransaction(txid) => txid.encode_size(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChainInfo {
    pub height: u64,
    pub tip: Digest,
}

impl Write for ChainInfo {
    fn write(&self, writer: &mut impl BufMut) {
        self.height.write(writer);
        self.tip.write(writer);
    }
}

impl Read for ChainInfo {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let height = u64::read(reader)?;
        let tip = Digest::read(reader)?;

        Ok(Self { height, tip })
    }
}

impl EncodeSize for ChainInfo {
    fn encode_size(&self) -> usize {
        self.height.encode_size() + self.tip.encode_size()
    }
}
