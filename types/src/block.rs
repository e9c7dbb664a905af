use crate::transaction::Transaction;
use bytes::{Buf, BufMut};
use commonware_codec::{
    varint::UInt, EncodeSize, Error, FixedSize, Read, ReadExt, ReadRangeExt, Write,
};
use commonware_cryptography::{
    ed25519::{PublicKey, Signature},
    sha256::{Digest, Sha256},
    Committable, Digestible, Hasher,
};

pub const MAX_BLOCK_TRANSACTIONS: usize = 256;

/// Upper bound on approvals carried by a block; a challenge never names more
/// signers than this.
pub const MAX_BLOCK_APPROVALS: usize = 64;

/// One signer's signature over a block's canonical digest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Approval {
    pub public: PublicKey,
    pub signature: Signature,
}

impl Write for Approval {
    fn write(&self, writer: &mut impl BufMut) {
        self.public.write(writer);
        self.signature.write(writer);
    }
}

impl Read for Approval {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let public = PublicKey::read(reader)?;
        let signature = Signature::read(reader)?;

        Ok(Self { public, signature })
    }
}

impl FixedSize for Approval {
    const SIZE: usize = PublicKey::SIZE + Signature::SIZE;
}

/// The signature payload authorizing a block. Carried alongside the block and
/// excluded from its digest: any qualifying signer subset produces a block
/// with the same identity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Authorization {
    pub approvals: Vec<Approval>,
}

impl Authorization {
    pub fn attach(&mut self, approval: Approval) {
        self.approvals.push(approval);
    }
}

impl Write for Authorization {
    fn write(&self, writer: &mut impl BufMut) {
        self.approvals.write(writer);
    }
}

impl Read for Authorization {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let approvals = Vec::<Approval>::read_range(reader, 0..=MAX_BLOCK_APPROVALS)?;

        Ok(Self { approvals })
    }
}

impl EncodeSize for Authorization {
    fn encode_size(&self) -> usize {
        self.approvals.encode_size()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub parent: Digest,
    pub height: u64,

    /// Ordered transactions; index 0 is the coinbase except at genesis.
    pub transactions: Vec<Transaction>,

    /// Excluded from the digest.
    pub authorization: Authorization,

    digest: Digest,
}

impl Block {
    fn compute_digest(parent: &Digest, height: u64, transactions: &[Transaction]) -> Digest {
        let mut hasher = Sha256::new();
        hasher.update(parent);
        hasher.update(&height.to_be_bytes());
        for transaction in transactions {
            hasher.update(&transaction.digest());
        }
        hasher.finalize()
    }

    pub fn new(
        parent: Digest,
        height: u64,
        transactions: Vec<Transaction>,
        authorization: Authorization,
    ) -> Self {
        assert!(transactions.len() <= MAX_BLOCK_TRANSACTIONS);
        let digest = Self::compute_digest(&parent, height, &transactions);
        Self {
            parent,
            height,
            transactions,
            authorization,
            digest,
        }
    }

    /// The txids confirmed by this block.
    pub fn txids(&self) -> impl Iterator<Item = Digest> + '_ {
        self.transactions.iter().map(|transaction| transaction.digest())
    }
}

impl Write for Block {
    fn write(&self, writer: &mut impl BufMut) {
        self.parent.write(writer);
        UInt(self.height).write(writer);
        self.transactions.write(writer);
        self.authorization.write(writer);
    }
}

impl Read for Block {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let parent = Digest::read(reader)?;
        let height = UInt::read(reader)?.into();
        let transactions = Vec::<Transaction>::read_range(reader, 0..=MAX_BLOCK_TRANSACTIONS)?;
        let authorization = Authorization::read(reader)?;

        // Pre-compute the digest
        let digest = Self::compute_digest(&parent, height, &transactions);
        Ok(Self {
            parent,
            height,
            transactions,
            authorization,
            digest,
        })
    }
}

impl EncodeSize for Block {
    fn encode_size(&self) -> usize {
        self.parent.encode_size()
            + UInt(self.height).encode_size()
            + self.transactions.encode_size()
            + self.authorization.encode_size()
    }
}

impl Digestible for Block {
    type Digest = Digest;

    fn digest(&self) -> Digest {
        self.digest
    }
}

impl Committable for Block {
    type Commitment = Digest;

    fn commitment(&self) -> Digest {
        self.digest
    }
}
