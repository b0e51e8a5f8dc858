pub mod stake_advisor;
