use super::*;

pub(crate) mod bench;
pub(crate) mod mine;

#[derive(Debug, Parser)]
pub(crate) enum Subcommand {
    #[command(about = "Benchmark the mining kernel")]
    Bench(bench::Bench),
    #[command(about = "Mine against a Stratum V1 pool")]
    Mine(mine::Mine),
}

impl Subcommand {
    pub(crate) fn run(self) -> Result {
        match self {
            Self::Bench(bench) => bench.run(),
            Self::Mine(mine) => {
                let runtime = Runtime::new()?;
                runtime.block_on(async {
                    let cancel = CancellationToken::new();

                    let signal_cancel = cancel.clone();
                    tokio::spawn(async move {
                        if ctrl_c().await.is_ok() {
                            info!("shutdown requested");
                            signal_cancel.cancel();
                        }
                    });

                    mine.run(cancel).await
                })
            }
        }
    }
}
