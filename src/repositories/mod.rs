pub mod match_states;
