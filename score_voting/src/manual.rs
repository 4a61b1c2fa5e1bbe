/*!

This is the long-form manual for `score_voting` and `lmcresults`.

## How the results are computed

Each registered user scores every participant of the event from 1 (lowest)
to 5 (highest). Participants are expected to score all the other
participants. Scoring their own entry is allowed but it never counts: it is
kept aside and reported in the `self vote` row of the votes sheet.

* **score**: the sum of the votes received.
* **average**: the mean of the votes received, with one decimal. A participant
  who did not receive any vote has `no average`.
* **5s, 4s, 3s, 2s, 1s**: how many times each score was received.
* **given**: the mean of the votes given by a voter, self-vote excluded.
* **generosity**: how far `given` is from the mean of `given` over all the
  voters, in percent. A negative value means a stricter than average voter.
* **total given**: the sum of the votes given by a voter. The votes sheet has
  it on every voter row, including the voters who do not take part, and in
  the `total given` summary row for the participants.
* **distribution**: how many votes of each score were cast, and their share of
  all the votes.

The scoreboard is sorted by score, then by the number of 5s, 4s, 3s and 2s.
Participants that are still tied after all these criteria keep the order of
their handles. Each participant gets its own placement: there are no shared
placements.

## Incomplete ballots

A participant who did not score every other participant blocks the results.
`lmcresults` lists these participants and asks whether to continue. If the
answer is yes, these participants are disqualified: their ballot is ignored
entirely, they receive votes as usual but appear at the end of the scoreboard
without a placement.

Voters who do not take part in the event are not required to score everyone.
Their partial ballots are only reported.

## Input formats

### `tinydb`

The database written by the voting website. The top-level keys are the event
numbers, and each document holds the handle of the voter and its votes, keyed
by artist names:

```text
{"18": {"1": {"user": "anna", "votes": {"DJ Bob": "4", "Carl": "5"}}}}
```

### `csv`

One vote per line, with a header. Voters and recipients may be handles or
artist names.

```text
voter,recipient,score
anna,DJ Bob,4
anna,Carl,5
```

## Configuration

The configuration file is in YAML (`.yaml`, `.yml`) or JSON:

```text
eventId: 18
usersFile: users.yaml
participantsFile: participants.yaml
ballotSources:
  - provider: tinydb
    filePath: votes.json
outputSettings:
  eventName: Libre Music Challenge
  outputDirectory: results
```

The paths are relative to the configuration file.

* `usersFile` maps every handle to its artist name: `users: {anna: Anna Banana}`
* `participantsFile` lists the artist names of the participants, per event:
  `18: [Anna Banana, DJ Bob]`
* `firstEvent` (optional, default 18) and `currentEvent` (optional): the range
  of the events that can be tabulated.

 */
