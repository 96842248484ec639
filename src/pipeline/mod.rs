pub mod diagnosis_time;
