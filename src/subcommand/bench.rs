use {super::*, rand::RngCore};

#[derive(Debug, Parser)]
pub(crate) struct Bench {
    #[arg(long, default_value = "5", help = "Seconds to run each pass for.")]
    seconds: u64,
}

impl Bench {
    pub(crate) fn run(self) -> Result {
        ensure!(self.seconds > 0, "benchmark duration must be at least 1s");

        let mut header = [0u8; 80];
        rand::rng().fill_bytes(&mut header);

        let duration = Duration::from_secs(self.seconds);

        // Realistic pass: a zero leading word keeps the round-60 early exit
        // in play, as it is for any integer pool difficulty.
        let filtered = self.pass(&header, ShareTarget::ALL_ZEROS, duration)?;
        println!("filtered:   {filtered}");

        // Unfiltered pass: a set leading word disables the early exit but is
        // still far too small to ever match, so every candidate runs all 128
        // rounds plus the full comparison.
        let unfiltered = self.pass(
            &header,
            ShareTarget::from_words([1, 0, 0, 0, 0, 0, 0, 0]),
            duration,
        )?;
        println!("unfiltered: {unfiltered}");

        Ok(())
    }

    fn pass(&self, header: &[u8; 80], target: ShareTarget, duration: Duration) -> Result<HashRate> {
        let job = MiningJob {
            midstate: sha256::midstate(header[..64].try_into().expect("header prefix is 64 bytes")),
            tail: header[64..].try_into().expect("header tail is 16 bytes"),
            target,
            nonce_start: 0,
            nonce_end: u32::MAX,
            job_id: "bench".parse().expect("static job id is valid"),
            extranonce2: 0,
            ntime: 0.into(),
        };

        let kernel = SoftwareKernel;
        let started = Instant::now();
        let mut nonce = 0u32;
        let mut hashes = 0u64;

        while started.elapsed() < duration {
            let end = nonce.saturating_add(NONCE_BATCH_SIZE - 1);
            match kernel.search(&job, nonce..=end) {
                // A fluke hit still hashed everything up to the winner.
                Some(found) => hashes += u64::from(found - nonce) + 1,
                None => hashes += u64::from(end - nonce) + 1,
            }
            nonce = end.wrapping_add(1);
        }

        Ok(HashRate(hashes as f64 / started.elapsed().as_secs_f64()))
    }
}
