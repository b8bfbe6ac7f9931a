use std::collections::BTreeMap;
use std::net::IpAddr;

use crate::ExporterSummary;
use crate::protocols::netflow_v9::Message;

// Forward distances beyond half the sequence space count as going back.
const SEQUENCE_WINDOW: u32 = 1 << 31;

#[derive(Debug, Default, Clone)]
pub(crate) struct ExporterStats {
    messages: u64,
    template_flowsets: u64,
    data_flowsets: u64,
    dropped_flowsets: u64,
    records: u64,
    last_sequence: Option<u32>,
    sequence_gaps: u64,
    missed_sequences: u64,
    out_of_order: u64,
}

impl ExporterStats {
    fn observe_sequence(&mut self, sequence: u32) {
        if let Some(last) = self.last_sequence {
            let expected = last.wrapping_add(1);
            let distance = sequence.wrapping_sub(expected);
            match distance {
                0 => {}
                d if d < SEQUENCE_WINDOW => {
                    self.sequence_gaps += 1;
                    self.missed_sequences += u64::from(d);
                }
                _ => {
                    self.out_of_order += 1;
                    return;
                }
            }
        }
        self.last_sequence = Some(sequence);
    }
}

#[derive(Debug, Default)]
pub(crate) struct ExporterTable {
    stats: BTreeMap<(IpAddr, u32), ExporterStats>,
}

impl ExporterTable {
    pub(crate) fn observe(&mut self, message: &Message, dropped_flowsets: u64) {
        let header = message.header();
        let entry = self
            .stats
            .entry((header.sender.ip(), header.source_id))
            .or_default();
        entry.messages += 1;
        entry.template_flowsets += message.templates().count() as u64;
        entry.data_flowsets += message.data_flowsets().count() as u64;
        entry.dropped_flowsets += dropped_flowsets;
        entry.observe_sequence(header.flow_sequence);
    }

    pub(crate) fn add_records(&mut self, message: &Message, records: u64) {
        let header = message.header();
        if let Some(entry) = self.stats.get_mut(&(header.sender.ip(), header.source_id)) {
            entry.records += records;
        }
    }

    pub(crate) fn into_summaries(self) -> Vec<ExporterSummary> {
        self.stats
            .into_iter()
            .map(|((address, source_id), stats)| ExporterSummary {
                address: address.to_string(),
                source_id,
                messages: stats.messages,
                template_flowsets: stats.template_flowsets,
                data_flowsets: stats.data_flowsets,
                dropped_flowsets: stats.dropped_flowsets,
                records: stats.records,
                sequence_gaps: stats.sequence_gaps,
                missed_sequences: stats.missed_sequences,
                out_of_order: stats.out_of_order,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{ExporterStats, ExporterTable};
    use crate::protocols::netflow_v9::{DatagramBuilder, decode_message};

    fn message(sender: &str, source_id: u32, sequence: u32) -> crate::Message {
        let bytes = DatagramBuilder::new()
            .source_id(source_id)
            .flow_sequence(sequence)
            .template(256, &[(8, 4)])
            .data(256, &[10, 0, 0, 1])
            .build()
            .unwrap();
        decode_message(
            &bytes,
            sender.parse().unwrap(),
            "10.0.0.254:2055".parse().unwrap(),
        )
        .unwrap()
        .unwrap()
    }

    #[test]
    fn counts_gaps_and_reordering() {
        let mut stats = ExporterStats::default();
        for sequence in [1, 2, 5, 6, 4, 7] {
            stats.observe_sequence(sequence);
        }
        assert_eq!(stats.sequence_gaps, 1);
        assert_eq!(stats.missed_sequences, 2);
        assert_eq!(stats.out_of_order, 1);
    }

    #[test]
    fn sequence_wraps_around() {
        let mut stats = ExporterStats::default();
        stats.observe_sequence(u32::MAX);
        stats.observe_sequence(0);
        assert_eq!(stats.sequence_gaps, 0);
        assert_eq!(stats.out_of_order, 0);
    }

    #[test]
    fn exporters_are_keyed_and_sorted() {
        let mut table = ExporterTable::default();
        table.observe(&message("10.0.0.2:4000", 1, 10), 0);
        table.observe(&message("10.0.0.1:4000", 7, 1), 1);
        table.observe(&message("10.0.0.1:4001", 7, 2), 0);
        let first = message("10.0.0.1:4001", 7, 2);
        table.add_records(&first, 3);

        let summaries = table.into_summaries();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].address, "10.0.0.1");
        assert_eq!(summaries[0].messages, 2);
        assert_eq!(summaries[0].template_flowsets, 2);
        assert_eq!(summaries[0].data_flowsets, 2);
        assert_eq!(summaries[0].dropped_flowsets, 1);
        assert_eq!(summaries[0].records, 3);
        assert_eq!(summaries[0].sequence_gaps, 0);
        assert_eq!(summaries[1].address, "10.0.0.2");
    }
}
