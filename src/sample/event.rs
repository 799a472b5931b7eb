//! The event model of the sample dataset and its conversion to arrays.
use arrow2::array::{
    Array, BooleanArray, Float32Array, Float64Array, Int8Array, ListArray, StructArray,
    UInt64Array, UInt8Array,
};
use arrow2::chunk::Chunk;
use arrow2::datatypes::{DataType, Field, Schema};
use arrow2::offset::{Offsets, OffsetsBuffer};
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::StandardNormal;

use crate::error::{Error, Result};

/// Trigger chains matched per lepton.
pub(crate) const LEPTON_TRIGGERS: usize = 8;
/// Trigger chains recorded per event.
pub(crate) const EVENT_TRIGGERS: usize = 15;

fn lepton_type() -> DataType {
    DataType::Struct(vec![
        Field::new("pt", DataType::Float32, true),
        Field::new("eta", DataType::Float32, true),
        Field::new("phi", DataType::Float32, true),
        Field::new("flavor", DataType::Int8, true),
        Field::new("isLoose", DataType::Boolean, true),
        Field::new("isMedium", DataType::Boolean, true),
        Field::new("isTight", DataType::Boolean, true),
        Field::new(
            "isTrigMatched",
            ListArray::<i32>::default_datatype(DataType::Boolean),
            true,
        ),
    ])
}

fn leptons_type() -> DataType {
    DataType::Struct(vec![
        Field::new("n", DataType::UInt8, true),
        Field::new(
            "leptons",
            ListArray::<i32>::default_datatype(lepton_type()),
            true,
        ),
    ])
}

fn jet_type() -> DataType {
    DataType::Struct(vec![
        Field::new("pt", DataType::Float32, true),
        Field::new("eta", DataType::Float32, true),
        Field::new("phi", DataType::Float32, true),
        Field::new("m", DataType::Float32, true),
        Field::new("truthHadronPt", DataType::Float32, true),
        Field::new("truthHadronId", DataType::Float32, true),
        Field::new("nTrk", DataType::UInt8, true),
        Field::new("isBjet", DataType::Boolean, true),
        Field::new("bTagScore", DataType::Float32, true),
    ])
}

fn jets_type() -> DataType {
    DataType::Struct(vec![
        Field::new("n", DataType::UInt8, true),
        Field::new(
            "jets",
            ListArray::<i32>::default_datatype(jet_type()),
            true,
        ),
    ])
}

fn met_type() -> DataType {
    DataType::Struct(vec![
        Field::new("sumEt", DataType::Float32, true),
        Field::new("met", DataType::Float32, true),
        Field::new("metPhi", DataType::Float32, true),
        Field::new("electronTerm", DataType::Float32, true),
        Field::new("muonTerm", DataType::Float32, true),
        Field::new("jetTerm", DataType::Float32, true),
        Field::new("softTerm", DataType::Float32, true),
    ])
}

fn event_type() -> DataType {
    DataType::Struct(vec![
        Field::new("w", DataType::Float64, true),
        Field::new("sumw2", DataType::Float64, true),
        Field::new("id", DataType::UInt64, true),
        Field::new(
            "trigMask",
            ListArray::<i32>::default_datatype(DataType::Boolean),
            true,
        ),
    ])
}

/// The schema of the sample event dataset.
///
/// Each row is one collision event: the event's leptons and jets together
/// with their multiplicities, the missing transverse energy and its terms,
/// and event-wide bookkeeping such as the generator weight and the event id.
pub fn schema() -> Schema {
    Schema::from(vec![
        Field::new("leptons", leptons_type(), true),
        Field::new("jets", jets_type(), true),
        Field::new("met", met_type(), true),
        Field::new("event", event_type(), true),
    ])
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Lepton {
    pub pt: f32,
    pub eta: f32,
    pub phi: f32,
    pub flavor: i8,
    pub is_loose: bool,
    pub is_medium: bool,
    pub is_tight: bool,
    pub trig_matched: Vec<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Jet {
    pub pt: f32,
    pub eta: f32,
    pub phi: f32,
    pub m: f32,
    pub truth_hadron_pt: f32,
    pub truth_hadron_id: f32,
    pub n_trk: u8,
    pub is_bjet: bool,
    pub btag_score: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Met {
    pub sum_et: f32,
    pub met: f32,
    pub met_phi: f32,
    pub electron_term: f32,
    pub muon_term: f32,
    pub jet_term: f32,
    pub soft_term: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EventInfo {
    pub w: f64,
    pub sumw2: f64,
    pub id: u64,
    pub trig_mask: Vec<bool>,
}

/// A single sampled collision event.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Event {
    pub leptons: Vec<Lepton>,
    pub jets: Vec<Jet>,
    pub met: Met,
    pub info: EventInfo,
}

/// Draws events from fixed distributions, deterministically for a seed.
#[derive(Debug)]
pub(crate) struct EventSampler {
    rng: StdRng,
    lepton_count: Uniform<usize>,
    jet_count: Uniform<usize>,
    flavor: Uniform<i8>,
    pt: Uniform<f32>,
    eta: Uniform<f32>,
    phi: Uniform<f32>,
    next_id: u64,
}

impl EventSampler {
    pub(crate) fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            lepton_count: Uniform::new_inclusive(0, 2),
            jet_count: Uniform::new_inclusive(0, 10),
            flavor: Uniform::new_inclusive(0, 2),
            pt: Uniform::new(0.0, 100.0),
            eta: Uniform::new(-2.7, 2.7),
            phi: Uniform::new(-3.14, 3.14),
            next_id: 0,
        }
    }

    fn weight(&mut self) -> f64 {
        let draw: f64 = StandardNormal.sample(&mut self.rng);
        1.0 + 0.3 * draw
    }

    pub(crate) fn sample(&mut self) -> Event {
        let id = self.next_id;
        self.next_id += 1;

        let leptons = (0..self.lepton_count.sample(&mut self.rng))
            .map(|index| Lepton {
                pt: self.pt.sample(&mut self.rng),
                eta: self.eta.sample(&mut self.rng),
                phi: self.phi.sample(&mut self.rng),
                flavor: self.flavor.sample(&mut self.rng),
                is_loose: true,
                is_medium: index % 2 == 0,
                is_tight: index % 4 == 0,
                trig_matched: (0..LEPTON_TRIGGERS).map(|trigger| trigger % 2 == 0).collect(),
            })
            .collect();

        let jets = (0..self.jet_count.sample(&mut self.rng))
            .map(|index| {
                let pt = self.pt.sample(&mut self.rng);
                Jet {
                    pt,
                    eta: self.eta.sample(&mut self.rng),
                    phi: self.phi.sample(&mut self.rng),
                    m: self.pt.sample(&mut self.rng),
                    truth_hadron_pt: (self.weight() * pt as f64) as f32,
                    truth_hadron_id: (index * 4) as f32,
                    n_trk: (index * 3) as u8,
                    is_bjet: index % 2 == 0,
                    btag_score: self.pt.sample(&mut self.rng),
                }
            })
            .collect();

        let magnitude = self.pt.sample(&mut self.rng);
        let met = Met {
            sum_et: self.pt.sample(&mut self.rng),
            met: magnitude,
            met_phi: self.phi.sample(&mut self.rng),
            electron_term: 0.3 * magnitude,
            muon_term: 0.05 * magnitude,
            jet_term: 0.6 * magnitude,
            soft_term: 0.05 * magnitude,
        };

        let w = self.weight();
        let info = EventInfo {
            w,
            sumw2: w * w,
            id,
            trig_mask: (0..EVENT_TRIGGERS).map(|trigger| trigger % 2 == 0).collect(),
        };

        Event {
            leptons,
            jets,
            met,
            info,
        }
    }
}

#[derive(Debug, Default)]
struct LeptonBuffer {
    n: Vec<u8>,
    lengths: Vec<usize>,
    pt: Vec<f32>,
    eta: Vec<f32>,
    phi: Vec<f32>,
    flavor: Vec<i8>,
    is_loose: Vec<bool>,
    is_medium: Vec<bool>,
    is_tight: Vec<bool>,
    trig_lengths: Vec<usize>,
    trig_matched: Vec<bool>,
}

impl LeptonBuffer {
    fn push(&mut self, leptons: &[Lepton]) {
        self.n.push(leptons.len() as u8);
        self.lengths.push(leptons.len());
        for lepton in leptons {
            self.pt.push(lepton.pt);
            self.eta.push(lepton.eta);
            self.phi.push(lepton.phi);
            self.flavor.push(lepton.flavor);
            self.is_loose.push(lepton.is_loose);
            self.is_medium.push(lepton.is_medium);
            self.is_tight.push(lepton.is_tight);
            self.trig_lengths.push(lepton.trig_matched.len());
            self.trig_matched.extend_from_slice(&lepton.trig_matched);
        }
    }

    fn into_array(self) -> Result<StructArray> {
        let trig_offsets: OffsetsBuffer<i32> =
            Offsets::try_from_lengths(self.trig_lengths.iter().copied())?.into();
        let trig_matched = ListArray::<i32>::new(
            ListArray::<i32>::default_datatype(DataType::Boolean),
            trig_offsets,
            BooleanArray::from_slice(&self.trig_matched).boxed(),
            None,
        );
        let items = StructArray::new(
            lepton_type(),
            vec![
                Float32Array::from_vec(self.pt).boxed(),
                Float32Array::from_vec(self.eta).boxed(),
                Float32Array::from_vec(self.phi).boxed(),
                Int8Array::from_vec(self.flavor).boxed(),
                BooleanArray::from_slice(&self.is_loose).boxed(),
                BooleanArray::from_slice(&self.is_medium).boxed(),
                BooleanArray::from_slice(&self.is_tight).boxed(),
                trig_matched.boxed(),
            ],
            None,
        );
        let offsets: OffsetsBuffer<i32> =
            Offsets::try_from_lengths(self.lengths.iter().copied())?.into();
        let list = ListArray::<i32>::new(
            ListArray::<i32>::default_datatype(lepton_type()),
            offsets,
            items.boxed(),
            None,
        );
        Ok(StructArray::new(
            leptons_type(),
            vec![UInt8Array::from_vec(self.n).boxed(), list.boxed()],
            None,
        ))
    }
}

#[derive(Debug, Default)]
struct JetBuffer {
    n: Vec<u8>,
    lengths: Vec<usize>,
    pt: Vec<f32>,
    eta: Vec<f32>,
    phi: Vec<f32>,
    m: Vec<f32>,
    truth_hadron_pt: Vec<f32>,
    truth_hadron_id: Vec<f32>,
    n_trk: Vec<u8>,
    is_bjet: Vec<bool>,
    btag_score: Vec<f32>,
}

impl JetBuffer {
    fn push(&mut self, jets: &[Jet]) {
        self.n.push(jets.len() as u8);
        self.lengths.push(jets.len());
        for jet in jets {
            self.pt.push(jet.pt);
            self.eta.push(jet.eta);
            self.phi.push(jet.phi);
            self.m.push(jet.m);
            self.truth_hadron_pt.push(jet.truth_hadron_pt);
            self.truth_hadron_id.push(jet.truth_hadron_id);
            self.n_trk.push(jet.n_trk);
            self.is_bjet.push(jet.is_bjet);
            self.btag_score.push(jet.btag_score);
        }
    }

    fn into_array(self) -> Result<StructArray> {
        let items = StructArray::new(
            jet_type(),
            vec![
                Float32Array::from_vec(self.pt).boxed(),
                Float32Array::from_vec(self.eta).boxed(),
                Float32Array::from_vec(self.phi).boxed(),
                Float32Array::from_vec(self.m).boxed(),
                Float32Array::from_vec(self.truth_hadron_pt).boxed(),
                Float32Array::from_vec(self.truth_hadron_id).boxed(),
                UInt8Array::from_vec(self.n_trk).boxed(),
                BooleanArray::from_slice(&self.is_bjet).boxed(),
                Float32Array::from_vec(self.btag_score).boxed(),
            ],
            None,
        );
        let offsets: OffsetsBuffer<i32> =
            Offsets::try_from_lengths(self.lengths.iter().copied())?.into();
        let list = ListArray::<i32>::new(
            ListArray::<i32>::default_datatype(jet_type()),
            offsets,
            items.boxed(),
            None,
        );
        Ok(StructArray::new(
            jets_type(),
            vec![UInt8Array::from_vec(self.n).boxed(), list.boxed()],
            None,
        ))
    }
}

#[derive(Debug, Default)]
struct MetBuffer {
    sum_et: Vec<f32>,
    met: Vec<f32>,
    met_phi: Vec<f32>,
    electron_term: Vec<f32>,
    muon_term: Vec<f32>,
    jet_term: Vec<f32>,
    soft_term: Vec<f32>,
}

impl MetBuffer {
    fn push(&mut self, met: &Met) {
        self.sum_et.push(met.sum_et);
        self.met.push(met.met);
        self.met_phi.push(met.met_phi);
        self.electron_term.push(met.electron_term);
        self.muon_term.push(met.muon_term);
        self.jet_term.push(met.jet_term);
        self.soft_term.push(met.soft_term);
    }

    fn into_array(self) -> StructArray {
        StructArray::new(
            met_type(),
            vec![
                Float32Array::from_vec(self.sum_et).boxed(),
                Float32Array::from_vec(self.met).boxed(),
                Float32Array::from_vec(self.met_phi).boxed(),
                Float32Array::from_vec(self.electron_term).boxed(),
                Float32Array::from_vec(self.muon_term).boxed(),
                Float32Array::from_vec(self.jet_term).boxed(),
                Float32Array::from_vec(self.soft_term).boxed(),
            ],
            None,
        )
    }
}

#[derive(Debug, Default)]
struct EventInfoBuffer {
    w: Vec<f64>,
    sumw2: Vec<f64>,
    id: Vec<u64>,
    trig_lengths: Vec<usize>,
    trig_mask: Vec<bool>,
}

impl EventInfoBuffer {
    fn push(&mut self, info: &EventInfo) {
        self.w.push(info.w);
        self.sumw2.push(info.sumw2);
        self.id.push(info.id);
        self.trig_lengths.push(info.trig_mask.len());
        self.trig_mask.extend_from_slice(&info.trig_mask);
    }

    fn into_array(self) -> Result<StructArray> {
        let offsets: OffsetsBuffer<i32> =
            Offsets::try_from_lengths(self.trig_lengths.iter().copied())?.into();
        let trig_mask = ListArray::<i32>::new(
            ListArray::<i32>::default_datatype(DataType::Boolean),
            offsets,
            BooleanArray::from_slice(&self.trig_mask).boxed(),
            None,
        );
        Ok(StructArray::new(
            event_type(),
            vec![
                Float64Array::from_vec(self.w).boxed(),
                Float64Array::from_vec(self.sumw2).boxed(),
                UInt64Array::from_vec(self.id).boxed(),
                trig_mask.boxed(),
            ],
            None,
        ))
    }
}

/// Accumulates events column by column, to be flushed as one row group.
#[derive(Debug, Default)]
pub(crate) struct EventBuffer {
    rows: usize,
    leptons: LeptonBuffer,
    jets: JetBuffer,
    met: MetBuffer,
    event: EventInfoBuffer,
}

impl EventBuffer {
    pub(crate) fn push(&mut self, event: &Event) {
        self.rows += 1;
        self.leptons.push(&event.leptons);
        self.jets.push(&event.jets);
        self.met.push(&event.met);
        self.event.push(&event.info);
    }

    pub(crate) fn len(&self) -> usize {
        self.rows
    }

    pub(crate) fn into_chunk(self) -> Result<Chunk<Box<dyn Array>>> {
        Chunk::try_new(vec![
            self.leptons.into_array()?.boxed(),
            self.jets.into_array()?.boxed(),
            self.met.into_array().boxed(),
            self.event.into_array()?.boxed(),
        ])
        .map_err(Error::Engine)
    }
}
