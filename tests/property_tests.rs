use image::DynamicImage;
use img_fit::{
    resize_to_fit, search_quality, BatchRunner, ConversionLimits, ConversionOutcome, ConvertError,
    ImageTask, ProgressSink, Result, RunTally, SizeProbe, TaskReport,
};
use proptest::prelude::*;
use std::path::PathBuf;

/// Probe backed by a precomputed size per quality level.
struct TableProbe {
    sizes: Vec<u64>,
}

impl SizeProbe for TableProbe {
    fn probe_size(&self, _img: &DynamicImage, quality: u8) -> Result<u64> {
        Ok(self.sizes[usize::from(quality)])
    }
}

/// Reference answer: scan each range from the top, first fit wins.
fn brute_force(sizes: &[u64], budget: u64) -> Option<u8> {
    (91..=100u8)
        .rev()
        .chain((50..=90u8).rev())
        .find(|&q| sizes[usize::from(q)] <= budget)
}

fn monotone_sizes() -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(0u64..5_000, 101).prop_map(|mut sizes| {
        sizes.sort_unstable();
        sizes
    })
}

struct CountingSink {
    completed: usize,
}

impl ProgressSink for CountingSink {
    fn on_complete(&mut self, _report: &TaskReport, _tally: &RunTally) {
        self.completed += 1;
    }
}

proptest! {
    #[test]
    fn search_matches_brute_force(sizes in monotone_sizes(), budget in 0u64..6_000) {
        let probe = TableProbe { sizes: sizes.clone() };
        let outcome = search_quality(&probe, &DynamicImage::new_rgb8(1, 1), budget).unwrap();

        match brute_force(&sizes, budget) {
            Some(quality) => {
                prop_assert!(outcome.found);
                prop_assert_eq!(outcome.quality, quality);
                prop_assert_eq!(outcome.achieved_bytes, sizes[usize::from(quality)]);
            }
            None => {
                prop_assert!(!outcome.found);
                prop_assert_eq!(outcome.quality, 50);
            }
        }
    }

    #[test]
    fn budget_is_floor_of_megabytes(tenths in 1u32..1_000) {
        let mb = f64::from(tenths) / 10.0;
        let limits = ConversionLimits::new(Some(mb), None).unwrap();
        let expected = (mb * 1024.0 * 1024.0).floor() as u64;
        prop_assert_eq!(limits.budget_bytes(), expected);
    }

    #[test]
    fn runner_tally_accounts_for_every_task(
        kinds in prop::collection::vec(0u8..4, 0..40),
        workers in 1usize..6,
    ) {
        let limits = ConversionLimits::default();
        let tasks: Vec<ImageTask> = (0..kinds.len())
            .map(|i| {
                ImageTask::new(
                    PathBuf::from(format!("/in/{}.png", i)),
                    PathBuf::from(format!("/out/{}.jpg", i)),
                    &limits,
                )
            })
            .collect();
        let outcome_for = |task: &ImageTask| {
            let index: usize = task.source.file_stem().unwrap().to_string_lossy().parse().unwrap();
            match kinds[index] {
                0 => ConversionOutcome::Copied,
                1 => ConversionOutcome::Converted { quality: 93 },
                2 => ConversionOutcome::ConvertedWithWarning { quality: 50, achieved_bytes: 9 },
                _ => ConversionOutcome::Failed(ConvertError::Unexpected("no".to_string())),
            }
        };
        let mut sink = CountingSink { completed: 0 };

        let tally = BatchRunner::new(Some(workers))
            .run_with(&tasks, &mut sink, outcome_for)
            .unwrap();

        prop_assert_eq!(tally.processed, kinds.len());
        prop_assert_eq!(tally.succeeded + tally.failed, kinds.len());
        prop_assert_eq!(tally.failed, kinds.iter().filter(|&&k| k == 3).count());
        prop_assert_eq!(tally.copied, kinds.iter().filter(|&&k| k == 0).count());
        prop_assert_eq!(sink.completed, kinds.len());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn resize_fits_bounds_and_keeps_aspect(
        width in 1u32..400,
        height in 1u32..400,
        max_dimension in 1u32..300,
    ) {
        let mut img = DynamicImage::new_rgb8(width, height);
        let resized = resize_to_fit(&mut img, max_dimension);

        if width <= max_dimension && height <= max_dimension {
            prop_assert!(!resized);
            prop_assert_eq!((img.width(), img.height()), (width, height));
        } else {
            prop_assert!(resized);
            prop_assert!(img.width() <= max_dimension && img.height() <= max_dimension);
            prop_assert!(img.width().max(img.height()) == max_dimension);
            let (long, short) = (width.max(height), width.min(height));
            let expected_short = (f64::from(short) * f64::from(max_dimension) / f64::from(long))
                .round()
                .max(1.0);
            let actual_short = f64::from(img.width().min(img.height()));
            prop_assert!((actual_short - expected_short).abs() <= 1.0,
                "short side {} expected about {}", actual_short, expected_short);
        }
    }
}
