use crate::{transaction_namespace, NAMESPACE};
use bytes::{Buf, BufMut};
use commonware_codec::{
    varint::UInt, DecodeExt, EncodeSize, Error, FixedSize, Read, ReadExt, ReadRangeExt, Write,
};
use commonware_cryptography::{
    ed25519::{self, PublicKey, Signature},
    sha256::{Digest, Sha256},
    Digestible, Hasher, Signer, Verifier,
};

pub const MAX_TRANSACTION_INPUTS: usize = 128;
pub const MAX_TRANSACTION_OUTPUTS: usize = 128;
pub const MAX_SCRIPT_LENGTH: usize = 1024;
pub const MAX_WITNESS_LENGTH: usize = 1024;

pub const COIN: u64 = 100_000_000;

/// Reward paid by the coinbase of every block.
pub const BLOCK_REWARD: u64 = 100 * COIN;

/// First byte of a commitment output script.
pub const COMMITMENT_MARKER: u8 = 0x6a;

/// Second byte of a commitment output script: the length of the pushed data
/// (4-byte header + 32-byte digest).
pub const COMMITMENT_PUSH: u8 = 0x24;

/// Identifies the pushed data as a template commitment.
pub const COMMITMENT_HEADER: [u8; 4] = [0xaa, 0x21, 0xa9, 0xed];

/// Marker + push length + header + digest. Everything past this offset in a
/// commitment output script is signer-specific and excluded from the txid.
pub const COMMITMENT_PREFIX_LENGTH: usize = 38;

/// Prefixes the signer solution appended to a commitment output script.
pub const SOLUTION_HEADER: [u8; 4] = [0xec, 0xc7, 0xda, 0xa2];

/// Truncate a commitment output script to its canonical prefix.
///
/// Scripts that do not carry a commitment pass through untouched. This is what
/// permits signer-specific padding past offset 38 without identity divergence.
pub fn canonical_script(script: &[u8]) -> &[u8] {
    if script.len() >= COMMITMENT_PREFIX_LENGTH
        && script[0] == COMMITMENT_MARKER
        && script[1] == COMMITMENT_PUSH
        && script[2..6] == COMMITMENT_HEADER
    {
        &script[..COMMITMENT_PREFIX_LENGTH]
    } else {
        script
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Input {
    /// The txid of the transaction being spent.
    pub source: Digest,
    pub index: u32,
}

impl Write for Input {
    fn write(&self, writer: &mut impl BufMut) {
        self.source.write(writer);
        self.index.write(writer);
    }
}

impl Read for Input {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let source = Digest::read(reader)?;
        let index = u32::read(reader)?;

        Ok(Self { source, index })
    }
}

impl FixedSize for Input {
    const SIZE: usize = Digest::SIZE + u32::SIZE;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Output {
    pub value: u64,
    pub script: Vec<u8>,
}

impl Output {
    /// Write the output with its script truncated to the canonical prefix.
    fn write_canonical(&self, writer: &mut impl BufMut) {
        self.value.write(writer);
        let script = canonical_script(&self.script);
        (script.len() as u32).write(writer);
        writer.put_slice(script);
    }
}

impl Write for Output {
    fn write(&self, writer: &mut impl BufMut) {
        self.value.write(writer);
        (self.script.len() as u32).write(writer);
        writer.put_slice(&self.script);
    }
}

impl Read for Output {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = u64::read(reader)?;
        let script_len = u32::read(reader)? as usize;
        if script_len > MAX_SCRIPT_LENGTH {
            return Err(Error::Invalid("Output", "script too long"));
        }
        if reader.remaining() < script_len {
            return Err(Error::EndOfBuffer);
        }
        let mut script = vec![0u8; script_len];
        reader.copy_to_slice(&mut script);

        Ok(Self { value, script })
    }
}

impl EncodeSize for Output {
    fn encode_size(&self) -> usize {
        u64::SIZE + 4 + self.script.len()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub inputs: Vec<Input>,
    pub outputs: Vec<Output>,

    /// Authorization payload (spender key and signature). Carried on the wire
    /// and in the wtxid, never in the txid.
    pub witness: Vec<u8>,
}

impl Transaction {
    /// The canonical bytes of the transaction: inputs and outputs with
    /// commitment scripts truncated, witness excluded.
    fn canonical_payload(&self) -> Vec<u8> {
        let mut payload = Vec::new();
        self.inputs.write(&mut payload);
        UInt(self.outputs.len() as u64).write(&mut payload);
        for output in &self.outputs {
            output.write_canonical(&mut payload);
        }

        payload
    }

    pub fn new(inputs: Vec<Input>, outputs: Vec<Output>) -> Self {
        Self {
            inputs,
            outputs,
            witness: Vec::new(),
        }
    }

    /// Build a coinbase paying the block reward, with a commitment output
    /// holding the canonical 38-byte prefix. Signers append their solution
    /// past the prefix.
    pub fn coinbase(reward_script: Vec<u8>, commitment: Digest) -> Self {
        let mut script = Vec::with_capacity(COMMITMENT_PREFIX_LENGTH);
        script.push(COMMITMENT_MARKER);
        script.push(COMMITMENT_PUSH);
        script.extend_from_slice(&COMMITMENT_HEADER);
        script.extend_from_slice(commitment.as_ref());

        Self {
            inputs: Vec::new(),
            outputs: vec![
                Output {
                    value: BLOCK_REWARD,
                    script: reward_script,
                },
                Output { value: 0, script },
            ],
            witness: Vec::new(),
        }
    }

    pub fn is_coinbase(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Sign a spend, attaching the spender's key and signature as the witness.
    pub fn sign(private: &ed25519::PrivateKey, inputs: Vec<Input>, outputs: Vec<Output>) -> Self {
        let mut transaction = Self::new(inputs, outputs);
        let signature = private.sign(
            &transaction_namespace(NAMESPACE),
            &transaction.canonical_payload(),
        );

        let mut witness = Vec::with_capacity(PublicKey::SIZE + Signature::SIZE);
        private.public_key().write(&mut witness);
        signature.write(&mut witness);
        transaction.witness = witness;

        transaction
    }

    /// Verify the witness against the canonical payload. Coinbases carry no
    /// witness and always verify.
    pub fn verify(&self) -> bool {
        if self.is_coinbase() {
            return self.witness.is_empty();
        }
        if self.witness.len() != PublicKey::SIZE + Signature::SIZE {
            return false;
        }
        let Ok(public) = PublicKey::decode(&self.witness[..PublicKey::SIZE]) else {
            return false;
        };
        let Ok(signature) = Signature::decode(&self.witness[PublicKey::SIZE..]) else {
            return false;
        };
        public.verify(
            &transaction_namespace(NAMESPACE),
            &self.canonical_payload(),
            &signature,
        )
    }

    /// The canonical transaction id: a digest of the transaction structure
    /// excluding the witness and any commitment-script suffix.
    pub fn txid(&self) -> Digest {
        let mut hasher = Sha256::new();
        hasher.update(&self.canonical_payload());
        hasher.finalize()
    }

    /// The witness transaction id: a digest of the full serialized bytes.
    pub fn wtxid(&self) -> Digest {
        let mut hasher = Sha256::new();
        let mut encoded = Vec::with_capacity(self.encode_size());
        self.write(&mut encoded);
        hasher.update(&encoded);
        hasher.finalize()
    }
}

impl Write for Transaction {
    fn write(&self, writer: &mut impl BufMut) {
        self.inputs.write(writer);
        self.outputs.write(writer);
        (self.witness.len() as u32).write(writer);
        writer.put_slice(&self.witness);
    }
}

impl Read for Transaction {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let inputs = Vec::<Input>::read_range(reader, 0..=MAX_TRANSACTION_INPUTS)?;
        let outputs = Vec::<Output>::read_range(reader, 0..=MAX_TRANSACTION_OUTPUTS)?;
        let witness_len = u32::read(reader)? as usize;
        if witness_len > MAX_WITNESS_LENGTH {
            return Err(Error::Invalid("Transaction", "witness too long"));
        }
        if reader.remaining() < witness_len {
            return Err(Error::EndOfBuffer);
        }
        let mut witness = vec![0u8; witness_len];
        reader.copy_to_slice(&mut witness);

        Ok(Self {
            inputs,
            outputs,
            witness,
        })
    }
}

impl EncodeSize for Transaction {
    fn encode_size(&self) -> usize {
        self.inputs.encode_size() + self.outputs.encode_size() + 4 + self.witness.len()
    }
}

impl Digestible for Transaction {
    type Digest = Digest;

    fn digest(&self) -> Digest {
        // We don't include the witness as part of the digest (any valid
        // witness will be valid for the transaction)
        self.txid()
    }
}
